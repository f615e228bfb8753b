//! Toast XML payload builder.

use crate::alert::AlertFields;

/// Escape text for use in XML content and attribute values
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Secondary line naming where the alert came from
pub fn attribution(alert: &AlertFields) -> Option<String> {
    if alert.source.is_empty() {
        None
    } else {
        Some(format!("via {}", alert.source))
    }
}

/// Render the `ToastGeneric` payload for an alert.
///
/// Mirrors what the native backend shows: title, body, attribution line,
/// circular app logo, long duration plus reminder scenario when the alert
/// requires interaction, and one button per action.
pub fn toast_xml(alert: &AlertFields, image_url: &str) -> String {
    let mut xml = String::new();

    if alert.require_interaction {
        xml.push_str("<toast duration=\"long\" scenario=\"reminder\">");
    } else {
        xml.push_str("<toast duration=\"short\">");
    }

    xml.push_str("<visual><binding template=\"ToastGeneric\">");
    if !image_url.is_empty() {
        xml.push_str(&format!(
            "<image placement=\"appLogoOverride\" hint-crop=\"circle\" src=\"{}\" alt=\"{}\"/>",
            escape(image_url),
            escape(&alert.source)
        ));
    }
    xml.push_str(&format!("<text>{}</text>", escape(&alert.title)));
    xml.push_str(&format!("<text>{}</text>", escape(&alert.text)));
    if let Some(line) = attribution(alert) {
        xml.push_str(&format!("<text>{}</text>", escape(&line)));
    }
    xml.push_str("</binding></visual>");

    if !alert.actions.is_empty() {
        xml.push_str("<actions>");
        for action in &alert.actions {
            xml.push_str(&format!(
                "<action content=\"{}\" arguments=\"{}\" activationType=\"foreground\"/>",
                escape(&action.title),
                escape(&action.action)
            ));
        }
        xml.push_str("</actions>");
    }

    xml.push_str("</toast>");
    xml
}
