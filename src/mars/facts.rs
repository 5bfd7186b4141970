use crate::{utils, ScrapeError, Stage};
use itertools::Itertools;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{debug, info};

const E: &str = "Invalid selector";
lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect(E);
    static ref ROW: Selector = Selector::parse("tr").expect(E);
    static ref CELL: Selector = Selector::parse("th, td").expect(E);
}

/// Column labels given to the two columns of the facts table.
pub const COLUMNS: [&str; 2] = ["Description", "Mars"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub description: String,
    pub mars: String,
}

/// Facts keyed by their description, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactsTable {
    rows: Vec<Fact>,
}

impl FactsTable {
    pub fn from_rows<D, M>(rows: impl IntoIterator<Item = (D, M)>) -> Self
    where
        D: Into<String>,
        M: Into<String>,
    {
        FactsTable {
            rows: rows
                .into_iter()
                .map(|(d, m)| Fact {
                    description: d.into(),
                    mars: m.into(),
                })
                .collect(),
        }
    }

    pub fn get(&self, description: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|f| f.description == description)
            .map(|f| f.mars.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table with `Description` as its index column, ready to be
    /// dropped into a page.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<table border=\"1\" class=\"dataframe\">\n");
        out.push_str("  <thead>\n");
        let _ = writeln!(
            out,
            "    <tr style=\"text-align: right;\">\n      <th></th>\n      <th>{}</th>\n    </tr>",
            COLUMNS[1]
        );
        let _ = writeln!(
            out,
            "    <tr>\n      <th>{}</th>\n      <th></th>\n    </tr>",
            COLUMNS[0]
        );
        out.push_str("  </thead>\n");
        out.push_str("  <tbody>\n");
        for fact in &self.rows {
            let _ = writeln!(
                out,
                "    <tr>\n      <th>{}</th>\n      <td>{}</td>\n    </tr>",
                utils::escape_html(&fact.description),
                utils::escape_html(&fact.mars)
            );
        }
        out.push_str("  </tbody>\n");
        out.push_str("</table>");
        out
    }
}

/// Downloads `url` and parses its first table.
pub async fn fetch_facts(client: &reqwest::Client, url: &str) -> Result<FactsTable, ScrapeError> {
    debug!("Visit {}", url);
    let http_err = |source| ScrapeError::Http {
        stage: Some(Stage::Facts),
        url: url.to_string(),
        source,
    };
    let html = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(http_err)?
        .text()
        .await
        .map_err(http_err)?;

    let facts = parse_facts(&Html::parse_document(&html), url)?;
    info!("Facts: {} rows", facts.len());
    Ok(facts)
}

/// Turns the first `<table>` of `doc` into a [`FactsTable`].
///
/// The table must have exactly two columns. A leading row made only of
/// header cells is taken as the table's own header and dropped, since the
/// columns are relabelled anyway.
pub fn parse_facts(doc: &Html, url: &str) -> Result<FactsTable, ScrapeError> {
    let unavailable = |reason: String| ScrapeError::DataUnavailable {
        stage: Stage::Facts,
        url: url.to_string(),
        reason,
    };

    let table = doc
        .select(&TABLE)
        .next()
        .ok_or_else(|| unavailable("no table on page".to_string()))?;

    let mut rows = table
        .select(&ROW)
        .map(|row| row.select(&CELL).collect_vec())
        .filter(|cells| !cells.is_empty())
        .peekable();

    let has_header = rows
        .peek()
        .map_or(false, |cells| cells.iter().all(|cell| cell.value().name() == "th"));
    if has_header {
        rows.next();
    }

    let mut facts = Vec::new();
    for (i, cells) in rows.enumerate() {
        match cells.as_slice() {
            [description, mars] => facts.push(Fact {
                description: cell_text(*description),
                mars: cell_text(*mars),
            }),
            other => {
                return Err(unavailable(format!(
                    "expected 2 columns, found {} in row {}",
                    other.len(),
                    i + 1
                )))
            }
        }
    }

    if facts.is_empty() {
        return Err(unavailable("table has no rows".to_string()));
    }

    Ok(FactsTable { rows: facts })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    utils::clean_text(cell.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const URL: &str = "https://facts.test/mars/";

    #[test]
    fn first_table_indexed_by_description() {
        let html = fs::read_to_string("tests/htmls/facts.html").expect("Invalid file path");
        let doc = Html::parse_document(&html);

        let facts = parse_facts(&doc, URL).unwrap();

        assert_eq!(
            facts,
            FactsTable::from_rows(vec![
                ("Equatorial Diameter", "6,792 km"),
                ("Mass", "6.39 × 10^23 kg"),
            ])
        );
        assert_eq!(facts.get("Mass"), Some("6.39 × 10^23 kg"));
        assert_eq!(facts.get("Moons"), None);
    }

    #[test]
    fn header_row_is_dropped() {
        let doc = Html::parse_document(
            r#"<table>
                 <thead><tr><th>Mars - Earth Comparison</th><th>Mars</th></tr></thead>
                 <tbody><tr><td>Moons:</td><td>2</td></tr></tbody>
               </table>"#,
        );

        let facts = parse_facts(&doc, URL).unwrap();

        assert_eq!(facts, FactsTable::from_rows(vec![("Moons:", "2")]));
    }

    #[test]
    fn no_table_is_unavailable() {
        let doc = Html::parse_document("<html><body><p>Moved</p></body></html>");
        let err = parse_facts(&doc, URL).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::DataUnavailable { stage: Stage::Facts, ref url, .. } if url == URL
        ));
    }

    #[test]
    fn three_columns_are_rejected() {
        let doc = Html::parse_document(
            r#"<table>
                 <tr><td>Diameter:</td><td>6,779 km</td><td>12,742 km</td></tr>
               </table>"#,
        );
        let err = parse_facts(&doc, URL).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::DataUnavailable { ref reason, .. }
                if reason == "expected 2 columns, found 3 in row 1"
        ));
    }

    #[test]
    fn header_only_table_is_unavailable() {
        let doc = Html::parse_document("<table><tr><th>a</th><th>b</th></tr></table>");
        assert!(matches!(
            parse_facts(&doc, URL),
            Err(ScrapeError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn renders_html_with_index_column() {
        let facts = FactsTable::from_rows(vec![("Moons:", "2"), ("Orbit <Sun>:", "687 days")]);

        assert_eq!(
            facts.to_html(),
            r#"<table border="1" class="dataframe">
  <thead>
    <tr style="text-align: right;">
      <th></th>
      <th>Mars</th>
    </tr>
    <tr>
      <th>Description</th>
      <th></th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <th>Moons:</th>
      <td>2</td>
    </tr>
    <tr>
      <th>Orbit &lt;Sun&gt;:</th>
      <td>687 days</td>
    </tr>
  </tbody>
</table>"#
        );
    }

    #[test]
    fn serializes_as_row_list() {
        let facts = FactsTable::from_rows(vec![("Moons:", "2")]);
        assert_eq!(
            serde_json::to_string(&facts).unwrap(),
            r#"[{"description":"Moons:","mars":"2"}]"#
        );
    }
}
