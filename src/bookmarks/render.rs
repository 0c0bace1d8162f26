//! HTML rendering for the bookmark pages
//!
//! Every user-supplied value goes through `escape_html`. Pages share one
//! layout; fragments (a single bookmark) are emitted without it so they can
//! be embedded by the caller.

use super::model::Bookmark;
use crate::http::escape_html;
use std::fmt::Write;

const STYLE: &str = r"
        body { font-family: -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 2em auto; max-width: 860px; color: #222; }
        table { border-collapse: collapse; width: 100%; }
        th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid #ddd; }
        .tag { background: #eef; border-radius: 4px; padding: 1px 6px; margin-right: 4px; font-size: 0.9em; }
        .inactive { opacity: 0.5; }
        .error { color: #b00; }
        form.inline { display: inline; }
        label { display: block; margin-top: 0.8em; }
        img.screenshot { max-width: 320px; border: 1px solid #ccc; }
";

/// Wrap `body` in the shared page layout
pub fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <nav><a href="/">Home</a> | <a href="/bookmarks">Bookmarks</a> | <a href="/bookmarks/new">New bookmark</a></nav>
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

pub fn home_page() -> String {
    page(
        "Bookmark Manager",
        "<h1>Welcome to the Bookmark Manager!</h1>\n<p><a href=\"/bookmarks\">Browse bookmarks</a></p>",
    )
}

/// Listing with edit and delete controls per row
pub fn list_page(bookmarks: &[Bookmark], method_field: Option<&str>) -> String {
    let mut body = String::from("<h1>Bookmarks</h1>\n");
    if bookmarks.is_empty() {
        body.push_str("<p>No bookmarks yet.</p>\n");
        return page("Bookmarks", &body);
    }

    body.push_str("<table>\n<tr><th>Title</th><th>Tags</th><th>Favorite</th><th></th></tr>\n");
    for b in bookmarks {
        let class = if b.is_active { "" } else { " class=\"inactive\"" };
        let _ = writeln!(
            body,
            "<tr{class}><td><a href=\"{url}\">{title}</a> (<a href=\"/bookmarks/{id}\">details</a>)</td>\
             <td>{tags}</td><td>{fav}</td><td><a href=\"/bookmarks/{id}/edit\">Edit</a> {delete}</td></tr>",
            url = escape_html(&b.url),
            title = escape_html(&b.title),
            id = b.id,
            tags = tag_list(&b.tags),
            fav = if b.favorite { "&#9733;" } else { "" },
            delete = delete_form(b.id, method_field),
        );
    }
    body.push_str("</table>\n");
    page("Bookmarks", &body)
}

/// A single bookmark without the layout
pub fn bookmark_fragment(b: &Bookmark) -> String {
    let mut out = format!(
        "<article class=\"bookmark\" id=\"bookmark-{id}\">\n<h2><a href=\"{url}\">{title}</a></h2>\n",
        id = b.id,
        url = escape_html(&b.url),
        title = escape_html(&b.title),
    );
    if !b.description.is_empty() {
        let _ = writeln!(out, "<p>{}</p>", escape_html(&b.description));
    }
    if !b.tags.is_empty() {
        let _ = writeln!(out, "<p>{}</p>", tag_list(&b.tags));
    }
    if let Some(category) = b.category_id {
        let _ = writeln!(out, "<p>Category #{category}</p>");
    }
    let _ = writeln!(
        out,
        "<p>{}{}</p>",
        if b.favorite { "Favorite. " } else { "" },
        if b.is_active { "Active" } else { "Inactive" }
    );
    if let Some(shot) = &b.screenshot_path {
        let _ = writeln!(
            out,
            "<img class=\"screenshot\" src=\"/uploads/{}\" alt=\"screenshot\">",
            escape_html(&urlencoding::encode(shot))
        );
    }
    out.push_str("</article>\n");
    out
}

pub fn show_page(b: &Bookmark) -> String {
    page(&b.title, &bookmark_fragment(b))
}

/// Confirmation after a write, with the affected record when there is one
pub fn message_page(message: &str, bookmark: Option<&Bookmark>) -> String {
    let mut body = format!("<p>{}</p>\n", escape_html(message));
    if let Some(b) = bookmark {
        body.push_str(&bookmark_fragment(b));
    }
    page(message, &body)
}

/// Create form (`existing` is `None`) or edit form
pub fn form_page(existing: Option<&Bookmark>, method_field: Option<&str>) -> String {
    let (heading, action, override_input) = match existing {
        Some(b) => (
            format!("Edit {}", escape_html(&b.title)),
            format!("/bookmarks/{}", b.id),
            hidden_method(method_field, "PUT"),
        ),
        None => ("New bookmark".to_string(), "/bookmarks".to_string(), String::new()),
    };

    let value = |f: fn(&Bookmark) -> String| {
        existing
            .map(f)
            .map(|v| escape_html(&v))
            .unwrap_or_default()
    };
    let checked = |f: fn(&Bookmark) -> bool, default: bool| {
        if existing.map_or(default, f) {
            " checked"
        } else {
            ""
        }
    };
    let screenshot = existing
        .and_then(|b| b.screenshot_path.as_deref())
        .map(|_| REMOVE_SCREENSHOT_CHECKBOX)
        .unwrap_or_default();

    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}" enctype="multipart/form-data">
{override_input}<label>Title <input type="text" name="title" value="{title}" required></label>
<label>URL <input type="url" name="url" value="{url}" required></label>
<label>Description <textarea name="description">{description}</textarea></label>
<label>Tags (comma separated) <input type="text" name="tags" value="{tags}"></label>
<label>Category id <input type="text" name="category_id" value="{category}"></label>
<label><input type="checkbox" name="favorite" value="on"{favorite}> Favorite</label>
<label><input type="checkbox" name="is_active" value="on"{active}> Active</label>
<label>Screenshot <input type="file" name="screenshot" accept="image/png,image/jpeg,image/gif,image/webp"></label>
{screenshot}<p><button type="submit">Save</button></p>
</form>
"#,
        title = value(|b| b.title.clone()),
        url = value(|b| b.url.clone()),
        description = value(|b| b.description.clone()),
        tags = value(|b| b.tags.join(", ")),
        category = value(|b| b.category_id.map(|c| c.to_string()).unwrap_or_default()),
        favorite = checked(|b| b.favorite, false),
        active = checked(|b| b.is_active, true),
    );
    page(&heading, &body)
}

fn tag_list(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("<span class=\"tag\">{}</span>", escape_html(t)))
        .collect()
}

const REMOVE_SCREENSHOT_CHECKBOX: &str = "<label><input type=\"checkbox\" \
    name=\"remove_screenshot\" value=\"on\"> Remove current screenshot</label>\n";

fn hidden_method(field: Option<&str>, method: &str) -> String {
    field
        .map(|f| {
            format!(
                "<input type=\"hidden\" name=\"{}\" value=\"{method}\">\n",
                escape_html(f)
            )
        })
        .unwrap_or_default()
}

fn delete_form(id: u64, method_field: Option<&str>) -> String {
    // Without a form field override, browsers cannot issue DELETE
    let Some(field) = method_field else {
        return String::new();
    };
    format!(
        "<form class=\"inline\" method=\"post\" action=\"/bookmarks/{id}\">{}\
         <button type=\"submit\">Delete</button></form>",
        hidden_method(Some(field), "DELETE").trim_end()
    )
}
