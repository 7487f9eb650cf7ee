//! HTML rendering: the form page, the itinerary body and the downloadable export

use askama::Template;
use pulldown_cmark::{Event, LinkType, Options, Parser, Tag, html};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::{Itinerary, ItinerarySource};
use crate::prompt::day_label;

fn is_safe_href(kind: LinkType, dest: &str) -> bool {
    if kind == LinkType::Email {
        return true;
    }
    let dest = dest.trim_start().to_ascii_lowercase();
    dest.starts_with("http://") || dest.starts_with("https://") || dest.starts_with("mailto:")
}

/// Markdown to HTML. Raw HTML in the model's text is shown as text and
/// links to anything but http(s) or mail keep only their label.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut dropped_link = false;
    let parser = Parser::new_ext(markdown, options).filter_map(move |event| match event {
        Event::Html(raw) => Some(Event::Text(raw)),
        Event::Start(Tag::Link(kind, dest, title)) => {
            if is_safe_href(kind, &dest) {
                Some(Event::Start(Tag::Link(kind, dest, title)))
            } else {
                dropped_link = true;
                None
            }
        }
        Event::End(Tag::Link(kind, dest, title)) => {
            if dropped_link {
                dropped_link = false;
                None
            } else {
                Some(Event::End(Tag::Link(kind, dest, title)))
            }
        }
        other => Some(other),
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// `itinerary-<slug>.html`
pub fn export_filename(destination: &str) -> String {
    let mut slug = String::new();
    for c in destination.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "itinerary.html".to_string()
    } else {
        format!("itinerary-{slug}.html")
    }
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem;line-height:1.5}\
label{display:block;margin-top:.8rem;font-weight:600}\
input[type=text],textarea{width:100%;padding:.4rem}\
.warning{background:#fff4d6;padding:.6rem;border-radius:4px}\
.error{background:#fde2e1;padding:.6rem;border-radius:4px}\
.itinerary{border-top:1px solid #ddd;margin-top:1.5rem}\
footer{color:#777;font-size:.85rem;margin-top:2rem}";

/// Standalone export document
#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Your {{ destination }} Itinerary</title>
<style>{{ style|safe }}</style>
</head>
<body>
<h1>Your {{ destination }} Itinerary</h1>
{{ body|safe }}
<footer>Generated by Travel Curator {{ version }}</footer>
</body>
</html>
"#,
    ext = "html"
)]
struct ExportTemplate<'a> {
    destination: &'a str,
    style: &'a str,
    body: String,
    version: &'a str,
}

/// The single page: form plus whatever the last submission produced.
/// Empty strings mean "nothing to show".
#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Travel Curator</title>
<style>{{ style|safe }}</style>
</head>
<body>
<h1>&#127757; Travel Curator</h1>
<p>Plan your trip like a local! Enter your destination and preferences below:</p>
<form method="post" action="/">
<label for="destination">Destination</label>
<input type="text" id="destination" name="destination" value="{{ destination }}">
<label for="preferences">Preferences</label>
<textarea id="preferences" name="preferences" rows="4">{{ preferences }}</textarea>
<label for="start_date">Start date</label>
<input type="date" id="start_date" name="start_date" value="{{ start_date }}">
<label for="days">Days: <output id="days_out">{{ days }}</output></label>
<input type="range" id="days" name="days" min="1" max="{{ max_days }}" value="{{ days }}" oninput="document.getElementById('days_out').value=this.value">
<label><input type="checkbox" name="test_mode" value="true"{% if test_mode %} checked{% endif %}> Test mode</label>
<p><button type="submit">Generate Itinerary</button></p>
</form>
{% if !warning.is_empty() %}<p class="warning">{{ warning }}</p>
{% endif %}{% if !error.is_empty() %}<p class="error">An error occurred: {{ error }}</p>
{% endif %}{% if has_itinerary %}<section class="itinerary">
<h2>Your Curated Itinerary</h2>
{% if !notice.is_empty() %}<p class="warning">{{ notice }}</p>
{% endif %}{% if !starting.is_empty() %}<p>Starting {{ starting }} &middot; {{ day_count }} day(s)</p>
{% endif %}{{ itinerary_html|safe }}
<form method="post" action="/download">
<input type="hidden" name="destination" value="{{ itinerary_destination }}">
<textarea name="markdown" hidden>{{ markdown }}</textarea>
<button type="submit">Download HTML</button>
</form>
</section>
{% endif %}</body>
</html>
"#,
    ext = "html"
)]
struct FormTemplate<'a> {
    style: &'a str,
    destination: &'a str,
    preferences: &'a str,
    start_date: &'a str,
    days: u8,
    max_days: u8,
    test_mode: bool,
    warning: &'a str,
    error: &'a str,
    has_itinerary: bool,
    notice: String,
    starting: String,
    day_count: usize,
    itinerary_html: String,
    itinerary_destination: &'a str,
    markdown: &'a str,
}

/// Standalone HTML document for an itinerary
pub fn export_html(itinerary: &Itinerary) -> Result<String> {
    export_document(&itinerary.destination, &itinerary.markdown)
}

pub fn export_document(destination: &str, markdown: &str) -> Result<String> {
    let template = ExportTemplate {
        destination,
        style: STYLE,
        body: render_markdown(markdown),
        version: crate::VERSION,
    };
    Ok(template.render()?)
}

/// Values shown in the form fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormValues {
    pub destination: String,
    #[serde(default)]
    pub preferences: String,
    /// `YYYY-MM-DD` from the date picker, empty when unset
    #[serde(default)]
    pub start_date: String,
    /// Missing means 0, which validation turns into a warning
    #[serde(default)]
    pub days: u8,
    #[serde(default)]
    pub test_mode: bool,
}

/// What to show under the form
#[derive(Debug)]
pub enum PageOutcome<'a> {
    Empty,
    Itinerary(&'a Itinerary),
    Warning(String),
    Error(String),
}

fn source_notice(source: &ItinerarySource) -> String {
    match source {
        ItinerarySource::Live { .. } => String::new(),
        ItinerarySource::Sample => "Test mode: showing the sample itinerary.".to_string(),
        ItinerarySource::Fallback { reason } => {
            format!("{reason} Showing the sample itinerary instead.")
        }
    }
}

pub fn form_page(form: &FormValues, max_days: u8, outcome: &PageOutcome<'_>) -> Result<String> {
    let mut template = FormTemplate {
        style: STYLE,
        destination: &form.destination,
        preferences: &form.preferences,
        start_date: &form.start_date,
        days: form.days,
        max_days,
        test_mode: form.test_mode,
        warning: "",
        error: "",
        has_itinerary: false,
        notice: String::new(),
        starting: String::new(),
        day_count: 0,
        itinerary_html: String::new(),
        itinerary_destination: "",
        markdown: "",
    };

    match outcome {
        PageOutcome::Empty => {}
        PageOutcome::Warning(message) => template.warning = message.as_str(),
        PageOutcome::Error(message) => template.error = message.as_str(),
        PageOutcome::Itinerary(itinerary) => {
            template.has_itinerary = true;
            template.notice = source_notice(&itinerary.source);
            template.starting = itinerary.start_date.map(day_label).unwrap_or_default();
            template.day_count = itinerary.days.len().max(1);
            template.itinerary_html = render_markdown(&itinerary.markdown);
            template.itinerary_destination = itinerary.destination.as_str();
            template.markdown = itinerary.markdown.as_str();
        }
    }

    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DaySegment;
    use chrono::NaiveDate;

    fn itinerary(source: ItinerarySource) -> Itinerary {
        Itinerary {
            destination: "Madrid & <Toledo>".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 5, 12),
            markdown: "Day 1:\nSee [Prado](https://www.museodelprado.es)\n".into(),
            days: vec![DaySegment {
                number: 1,
                date: NaiveDate::from_ymd_opt(2025, 5, 12),
                text: "Day 1:\nSee [Prado](https://www.museodelprado.es)".into(),
            }],
            source,
        }
    }

    fn form() -> FormValues {
        FormValues {
            destination: "Madrid".into(),
            preferences: "cats \"and\" food".into(),
            start_date: String::new(),
            days: 2,
            test_mode: true,
        }
    }

    #[test]
    fn test_render_markdown_links_and_raw_html() {
        let html = render_markdown("Go to [Prado](https://www.museodelprado.es)\n\n<script>alert(1)</script>\n");
        assert!(html.contains("<a href=\"https://www.museodelprado.es\">Prado</a>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_markdown_autolink() {
        let html = render_markdown("Cat Cafe (<https://catcafe.example>)");
        assert!(html.contains("<a href=\"https://catcafe.example\">"));
    }

    #[test]
    fn test_render_markdown_drops_script_links() {
        let html = render_markdown(
            "[Gatos](javascript:alert(document.cookie)) and <javascript:alert(1)> and [Docs](data:text/html,hi)",
        );
        assert!(!html.contains("href=\"javascript:"));
        assert!(!html.contains("href=\"data:"));
        assert!(html.contains("Gatos and"));
        assert!(html.contains("Docs"));

        let html = render_markdown("Write to <info@gatos.example>");
        assert!(html.contains("href=\"mailto:info@gatos.example\""));
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("New York"), "itinerary-new-york.html");
        assert_eq!(export_filename("  São Paulo!! "), "itinerary-s-o-paulo.html");
        assert_eq!(export_filename("東京"), "itinerary.html");
    }

    #[test]
    fn test_export_html_escapes_destination() {
        let doc = export_html(&itinerary(ItinerarySource::Live { model: "gpt-4o".into() })).unwrap();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Your Madrid &"));
        assert!(!doc.contains("<Toledo>"));
        assert!(doc.contains("<a href=\"https://www.museodelprado.es\">Prado</a>"));
        assert!(doc.contains(&format!("Generated by Travel Curator {}", crate::VERSION)));
    }

    #[test]
    fn test_form_page_keeps_values() {
        let page = form_page(&form(), 7, &PageOutcome::Empty).unwrap();
        assert!(page.contains("value=\"Madrid\""));
        assert!(page.contains(">cats &"));
        assert!(!page.contains("cats \"and\" food"));
        assert!(page.contains("max=\"7\" value=\"2\""));
        assert!(page.contains(" checked>"));
        assert!(!page.contains("Your Curated Itinerary"));
        assert!(!page.contains("class=\"warning\""));
    }

    #[test]
    fn test_form_page_with_itinerary_and_notice() {
        let itinerary = itinerary(ItinerarySource::Fallback {
            reason: "Could not generate itinerary.".into(),
        });
        let page = form_page(&form(), 7, &PageOutcome::Itinerary(&itinerary)).unwrap();
        assert!(page.contains("Your Curated Itinerary"));
        assert!(page.contains("Could not generate itinerary. Showing the sample itinerary instead."));
        assert!(page.contains("Starting Mon 12 May"));
        assert!(page.contains("action=\"/download\""));
        assert!(page.contains("<a href=\"https://www.museodelprado.es\">Prado</a>"));
        // the hidden markdown copy is escaped, the rendered body is not
        assert!(page.contains("hidden>Day 1:"));
        assert!(!page.contains("name=\"destination\" value=\"Madrid & <Toledo>\""));
    }

    #[test]
    fn test_form_page_messages_are_escaped() {
        let page = form_page(&form(), 7, &PageOutcome::Error("<boom>".into())).unwrap();
        assert!(page.contains("An error occurred: &"));
        assert!(!page.contains("<boom>"));

        let page = form_page(&form(), 7, &PageOutcome::Warning("Please enter a destination.".into())).unwrap();
        assert!(page.contains("class=\"warning\">Please enter a destination."));
    }

    #[test]
    fn test_missing_days_field_defaults_to_zero() {
        let form: FormValues = serde_json::from_str(r#"{"destination": "Madrid"}"#).unwrap();
        assert_eq!(form.days, 0);
    }
}
