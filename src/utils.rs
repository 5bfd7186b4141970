use chrono::{DateTime, FixedOffset, Local};
use lazy_regex::regex;
use sqlx::SqlitePool;

pub(crate) async fn is_table_exists(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<bool, sqlx::Error> {
    Ok(
        sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?
            .is_some(),
    )
}

pub(crate) fn get_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

/// Collapses runs of whitespace the way a browser renders text.
pub(crate) fn clean_text<S: AsRef<str>>(raw: S) -> String {
    regex!(r"\s+")
        .replace_all(raw.as_ref(), " ")
        .trim()
        .to_string()
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("\n   NASA's   Rover\n\tLands  "), "NASA's Rover Lands");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn escape_html_special_characters() {
        assert_eq!(escape_html(r#"<a href="x">R&D</a>"#), "&lt;a href=&quot;x&quot;&gt;R&amp;D&lt;/a&gt;");
    }
}
