//! Minimal server-rendered pages. Presentation proper lives outside this
//! system; these stand in for the view layer with the smallest surface that
//! lets the handlers return something browsable.
use crate::records::Record;

const COLUMN_HEADERS: &[&str] = &[
    "Last Name",
    "Maiden Name",
    "First Name",
    "Middle Name",
    "Title",
    "Born",
    "Died",
    "Age",
    "Veteran",
    "Section",
    "Lot",
    "Moved From",
    "Moved To",
    "Notes",
];

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }

    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>",
        escape(title),
        body
    )
}

fn search_form() -> String {
    "<form action=\"/search\" method=\"get\">\
     <input name=\"lastName\" placeholder=\"Last name\">\
     <input name=\"firstName\" placeholder=\"First name\">\
     <input name=\"birthYear\" placeholder=\"Birth year\">\
     <input name=\"deathYear\" placeholder=\"Death year\">\
     <button type=\"submit\">Search</button>\
     </form>"
        .to_string()
}

pub fn landing() -> String {
    layout(
        "Cemetery Records",
        &format!("<h1>Cemetery Records</h1>{}", search_form()),
    )
}

pub fn results(records: &[Record]) -> String {
    let mut body = format!("<h1>Cemetery Records</h1>{}", search_form());

    if records.is_empty() {
        body.push_str("<p>No records matched your search.</p>");
        return layout("Search Results", &body);
    }

    body.push_str("<table border=\"1\"><tr>");
    for header in COLUMN_HEADERS {
        body.push_str(&format!("<th>{header}</th>"));
    }
    body.push_str("</tr>");

    for record in records {
        body.push_str("<tr>");
        for value in row_values(record) {
            body.push_str(&format!("<td>{}</td>", escape(&value)));
        }
        body.push_str("</tr>");
    }
    body.push_str("</table>");

    layout("Search Results", &body)
}

fn row_values(record: &Record) -> Vec<String> {
    let text = |field: &Option<String>| field.clone().unwrap_or_default();

    vec![
        text(&record.last_name),
        text(&record.maiden_name),
        text(&record.first_name),
        text(&record.middle_name),
        text(&record.title),
        text(&record.birth_date),
        text(&record.death_date),
        text(&record.age),
        match record.is_veteran {
            Some(true) => "Yes".to_string(),
            Some(false) => "No".to_string(),
            None => String::new(),
        },
        text(&record.section),
        text(&record.lot),
        text(&record.moved_from),
        text(&record.moved_to),
        text(&record.notes),
    ]
}

pub fn login_form(message: Option<&str>) -> String {
    let notice = message
        .map(|m| format!("<p>{}</p>", escape(m)))
        .unwrap_or_default();

    layout(
        "Administrator Login",
        &format!(
            "<h1>Administrator Login</h1>{notice}\
             <form action=\"/login\" method=\"post\">\
             <input name=\"username\" placeholder=\"Username\">\
             <input name=\"password\" type=\"password\" placeholder=\"Password\">\
             <button type=\"submit\">Log in</button>\
             </form>"
        ),
    )
}

pub fn update_lookup() -> String {
    layout(
        "Update a Record",
        "<h1>Update a Record</h1>\
         <form action=\"/getUpdateRecord\" method=\"get\">\
         <input name=\"memorialID\" placeholder=\"Memorial ID\">\
         <button type=\"submit\">Fetch record</button>\
         </form>\
         <p><a href=\"/logout\">Log out</a></p>",
    )
}

pub fn edit_form(record: &Record) -> String {
    let id = record
        .memorial_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    let field = |name: &str, value: &Option<String>| {
        format!(
            "<label>{name} <input name=\"{name}\" value=\"{}\"></label><br>",
            escape(value.as_deref().unwrap_or(""))
        )
    };
    let year = |name: &str, value: Option<i64>| {
        format!(
            "<label>{name} <input name=\"{name}\" value=\"{}\"></label><br>",
            value.map(|y| y.to_string()).unwrap_or_default()
        )
    };

    let mut body = format!(
        "<h1>Editing Memorial {}</h1>\
         <form action=\"/updateRecord\" method=\"post\">\
         <input type=\"hidden\" name=\"memorialID\" value=\"{}\">",
        escape(&id),
        escape(&id)
    );

    body.push_str(&field("last_name", &record.last_name));
    body.push_str(&field("maiden_name", &record.maiden_name));
    body.push_str(&field("first_name", &record.first_name));
    body.push_str(&field("middle_name", &record.middle_name));
    body.push_str(&field("title", &record.title));
    body.push_str(&field("birth_date", &record.birth_date));
    body.push_str(&field("death_date", &record.death_date));
    body.push_str(&year("birth_year", record.birth_year));
    body.push_str(&year("death_year", record.death_year));
    body.push_str(&field("age", &record.age));
    body.push_str(&format!(
        "<label>is_veteran <input name=\"is_veteran\" value=\"{}\"></label><br>",
        match record.is_veteran {
            Some(true) => "true",
            _ => "false",
        }
    ));
    body.push_str(&field("section", &record.section));
    body.push_str(&field("lot", &record.lot));
    body.push_str(&field("moved_from", &record.moved_from));
    body.push_str(&field("moved_to", &record.moved_to));
    body.push_str(&field("notes", &record.notes));
    body.push_str("<button type=\"submit\">Save changes</button></form>");

    layout("Edit Record", &body)
}

pub fn message(text: &str) -> String {
    layout(
        "Cemetery Records",
        &format!(
            "<p>{}</p><p><a href=\"/updatePage\">Back to updates</a></p>",
            escape(text)
        ),
    )
}
