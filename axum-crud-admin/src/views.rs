//! Server-rendered HTML
//!
//! Every page is built from plain strings around one shared layout. All
//! user-controlled text passes through [`escape`].

use crate::resource::{FormValues, InputKind, Page, Resource};
use std::fmt::Write;

/// Escape text for use in HTML element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Wrap a page body in the shared document shell
///
/// `current_user` is the login of the signed-in operator, if any.
pub fn layout(title: &str, flashes: &[String], current_user: Option<&str>, body: &str) -> String {
    let mut navigation = String::from(
        r#"<a href="/">Home</a> <a href="/admin/pages">Pages</a> <a href="/admin/users">Users</a>"#,
    );
    match current_user {
        Some(login) => {
            let _ = write!(
                navigation,
                r#" <span data-selenium="current-user">{}</span> <a href="/logout">Logout</a>"#,
                escape(login)
            );
        }
        None => navigation.push_str(r#" <a href="/login">Login</a>"#),
    }

    let mut flash_list = String::new();
    if !flashes.is_empty() {
        flash_list.push_str(r#"<ul class="flashes">"#);
        for flash in flashes {
            let _ = write!(flash_list, "<li>{}</li>", escape(flash));
        }
        flash_list.push_str("</ul>");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<nav>{}</nav>\n{}\n<main>\n{}\n</main>\n</body>\n</html>\n",
        escape(title),
        navigation,
        flash_list,
        body
    )
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut list = String::from(r#"<ul class="errors">"#);
    for error in errors {
        let _ = write!(list, "<li>{}</li>", escape(error));
    }
    list.push_str("</ul>");
    list
}

/// Error page listing one message per problem
pub fn error_page(messages: &[String], current_user: Option<&str>) -> String {
    let body = format!("<h1>Error</h1>\n{}", error_list(messages));
    layout("Error", &[], current_user, &body)
}

/// Table of every record with show, edit and delete actions
pub fn resource_index<R: Resource>(
    records: &[R],
    flashes: &[String],
    current_user: Option<&str>,
) -> String {
    let label_header = R::FIELDS.first().map(|field| field.label).unwrap_or("Name");

    let mut rows = String::new();
    for record in records {
        let label = escape(record.label());
        let _ = write!(
            rows,
            concat!(
                "<tr><td>{id}</td><td>{label}</td><td>",
                r#"<a href="{show}" data-selenium="show-{label}">Show</a> "#,
                r#"<a href="{show}/edit" data-selenium="edit-{label}">Edit</a> "#,
                r#"<form method="post" action="{show}/delete" style="display:inline">"#,
                r#"<button type="submit" data-selenium="delete-{label}">Delete</button></form>"#,
                "</td></tr>\n"
            ),
            id = record.id(),
            label = label,
            show = R::show_path(record.id()),
        );
    }

    let body = format!(
        concat!(
            "<h1>{plural}</h1>\n",
            r#"<p><a href="{index}/new">New {name}</a></p>"#,
            "\n<table>\n<thead><tr><th>ID</th><th>{label_header}</th><th>Actions</th></tr></thead>\n",
            "<tbody>\n{rows}</tbody>\n</table>"
        ),
        plural = R::PLURAL,
        index = R::index_path(),
        name = R::NAME,
        label_header = label_header,
        rows = rows,
    );
    layout(R::PLURAL, flashes, current_user, &body)
}

/// Create or edit form
///
/// `id` is `None` for a new record. Password inputs are never prefilled.
pub fn resource_form<R: Resource>(
    id: Option<i64>,
    values: &FormValues,
    errors: &[String],
    current_user: Option<&str>,
) -> String {
    let (heading, action) = match id {
        Some(id) => (format!("Edit {}", R::NAME), format!("{}/update", R::show_path(id))),
        None => (format!("New {}", R::NAME), format!("{}/create", R::index_path())),
    };

    let mut inputs = String::new();
    for field in R::FIELDS {
        let value = values.get(field.name).map(String::as_str).unwrap_or("");
        let _ = write!(
            inputs,
            r#"<p><label for="{name}">{label}</label><br>"#,
            name = field.name,
            label = field.label
        );
        let _ = match field.input {
            InputKind::Text => write!(
                inputs,
                r#"<input type="text" id="{name}" name="{name}" value="{value}">"#,
                name = field.name,
                value = escape(value)
            ),
            InputKind::TextArea => write!(
                inputs,
                r#"<textarea id="{name}" name="{name}" rows="10">{value}</textarea>"#,
                name = field.name,
                value = escape(value)
            ),
            InputKind::Password => write!(
                inputs,
                r#"<input type="password" id="{name}" name="{name}" value="">"#,
                name = field.name
            ),
        };
        inputs.push_str("</p>\n");
    }

    let body = format!(
        concat!(
            "<h1>{heading}</h1>\n{errors}\n",
            r#"<form method="post" action="{action}">"#,
            "\n{inputs}",
            r#"<button type="submit">Save</button>"#,
            "\n</form>\n",
            r#"<p><a href="{index}">Back</a></p>"#
        ),
        heading = heading,
        errors = error_list(errors),
        action = action,
        inputs = inputs,
        index = R::index_path(),
    );
    layout(&heading, &[], current_user, &body)
}

/// One record rendered as indented JSON
pub fn resource_show<R: Resource>(record: &R, current_user: Option<&str>) -> String {
    let json = serde_json::to_string_pretty(record).unwrap_or_default();
    let heading = format!("Showing {} {}", R::NAME, record.id());
    let body = format!(
        concat!(
            "<h1>{heading}</h1>\n<pre>{json}</pre>\n",
            r#"<p><a href="{show}/edit">Edit</a> <a href="{index}">Back</a></p>"#
        ),
        heading = heading,
        json = escape(&json),
        show = R::show_path(record.id()),
        index = R::index_path(),
    );
    layout(&heading, &[], current_user, &body)
}

pub fn login_page(errors: &[String], flashes: &[String]) -> String {
    let body = format!(
        concat!(
            "<h1>Login</h1>\n{errors}\n",
            r#"<form method="post" action="/login">"#,
            r#"<p><label for="login">Login</label><br><input type="text" id="login" name="login"></p>"#,
            r#"<p><label for="password">Password</label><br><input type="password" id="password" name="password"></p>"#,
            r#"<button type="submit">Login</button></form>"#
        ),
        errors = error_list(errors),
    );
    layout("Login", flashes, None, &body)
}

pub fn tools_page(flashes: &[String], current_user: Option<&str>) -> String {
    let body = concat!(
        "<h1>Tools</h1>\n<ul>\n",
        r#"<li><a href="/tools/db-clear" data-selenium="db-clear">Clear database</a></li>"#,
        "\n",
        r#"<li><a href="/tools/seed" data-selenium="seed">Seed database</a></li>"#,
        "\n</ul>\n",
        r#"<form method="get" action="/tools/sql">"#,
        r#"<p><label for="q">SQL</label><br><textarea id="q" name="q" rows="5"></textarea></p>"#,
        r#"<button type="submit">Run</button></form>"#
    );
    layout("Tools", flashes, current_user, body)
}

/// Public list of every page
pub fn public_index(pages: &[Page], current_user: Option<&str>) -> String {
    let mut items = String::new();
    for page in pages {
        let _ = writeln!(
            items,
            r#"<li><a href="{}">{}</a></li>"#,
            escape(&page.public_path()),
            escape(&page.slug)
        );
    }
    let body = format!(
        "<h1>Pages</h1>\n<ul data-selenium=\"page-list\">\n{}</ul>",
        items
    );
    layout("Pages", &[], current_user, &body)
}

pub fn public_page(page: &Page, current_user: Option<&str>) -> String {
    let body = format!(
        "<h1>{}</h1>\n<article>{}</article>",
        escape(&page.slug),
        escape(&page.content)
    );
    layout(&page.slug, &[], current_user, &body)
}
