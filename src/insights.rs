//! Turns raw web search hits into a source-attributed "traveler insights"
//! Markdown document. Output depends only on the input, never on time or
//! randomness.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::models::{ResourceLink, SearchHit};

pub const RESOURCE_LINKS_HEADING: &str = "## Useful Resource Links";

const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Host fragment → canonical site name. First match wins.
const KNOWN_SOURCES: &[(&str, &str)] = &[
    ("tripadvisor", "Tripadvisor"),
    ("lonelyplanet", "Lonely Planet"),
    ("wikitravel", "Wikitravel"),
    ("wikivoyage", "Wikivoyage"),
    ("booking", "Booking.com"),
    ("expedia", "Expedia"),
    ("timeout", "Time Out"),
    ("cntraveler", "Condé Nast Traveler"),
    ("nationalgeographic", "National Geographic"),
    ("fodors", "Fodor's"),
    ("frommers", "Frommer's"),
    ("reddit", "Reddit"),
];

const THEMATIC_SECTIONS: &str = "\
## Best Time to Visit

- Shoulder seasons usually bring milder weather, thinner crowds and lower prices.
- Check local holidays and festival dates before booking; they can fill hotels quickly.

## Local Experiences

- Spend at least one morning at a neighbourhood market rather than a tourist hub.
- Guided walking tours led by residents are a quick way to learn a city's layout and history.
- Try the dishes locals eat on weekdays, not only the famous specialities.

## Travel Tips

- Keep digital and paper copies of travel documents.
- Learn a few basic phrases in the local language.
- Public transport passes often pay off after two or three days of sightseeing.
";

const FALLBACK_RESOURCE_LINKS: &[(&str, &str, &str)] = &[
    ("Tripadvisor Travel Guide", "https://www.tripadvisor.com/", "Tripadvisor"),
    ("Lonely Planet Destination Guide", "https://www.lonelyplanet.com/", "Lonely Planet"),
    ("Wikitravel Open Travel Guide", "https://wikitravel.org/", "Wikitravel"),
];

#[derive(Debug, Clone, Default)]
pub struct SearchResultFormatter;

impl SearchResultFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_insights(&self, hits: &[SearchHit], destination: &str) -> String {
        if hits.is_empty() {
            return fallback_insights(destination);
        }

        let mut doc = String::new();
        let _ = writeln!(doc, "# Traveler Insights for {destination}\n");
        doc.push_str("## What Travelers Are Saying\n\n");

        for (index, hit) in hits.iter().enumerate() {
            let _ = writeln!(doc, "### {}. {}\n", index + 1, clean_title(&hit.title));
            let _ = writeln!(doc, "{}\n", hit.snippet);
            let _ = writeln!(doc, "*Source: {}*\n", source_name(&hit.link));
        }

        doc.push_str(THEMATIC_SECTIONS);

        let links = resource_links(hits);
        if !links.is_empty() {
            doc.push('\n');
            doc.push_str(&render_links(&links));
        }

        doc
    }
}

/// Document returned when search produced nothing.
pub fn fallback_insights(destination: &str) -> String {
    let mut doc = String::new();
    let _ = writeln!(doc, "# Traveler Insights for {destination}\n");
    doc.push_str("Live traveler reviews could not be retrieved, so here are general pointers.\n\n");
    doc.push_str(THEMATIC_SECTIONS);
    doc.push('\n');

    let links: Vec<ResourceLink> = FALLBACK_RESOURCE_LINKS
        .iter()
        .map(|(title, url, source)| ResourceLink {
            title: title.to_string(),
            url: url.to_string(),
            source_name: source.to_string(),
        })
        .collect();
    doc.push_str(&render_links(&links));
    doc
}

/// Strip a trailing site suffix such as `" | Lonely Planet"` or `" • Blog"`.
pub fn clean_title(title: &str) -> String {
    static SUFFIX_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+[|•]\s+.*$").expect("valid regex"));

    let trimmed = title.trim();
    let cleaned = SUFFIX_RE.replace(trimmed, "");
    if cleaned.trim().is_empty() {
        trimmed.to_string()
    } else {
        cleaned.trim().to_string()
    }
}

pub fn source_name(link: &str) -> String {
    let host = match Url::parse(link.trim()) {
        Ok(url) => match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return UNKNOWN_SOURCE.to_string(),
        },
        Err(_) => return UNKNOWN_SOURCE.to_string(),
    };

    if let Some((_, canonical)) = KNOWN_SOURCES
        .iter()
        .find(|(fragment, _)| host.contains(fragment))
    {
        return canonical.to_string();
    }

    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.split('.').next().unwrap_or_default();
    capitalize(label).unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

fn capitalize(word: &str) -> Option<String> {
    let mut chars = word.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// One link per hit whose link is non-empty and starts with `http`, in input order.
pub fn resource_links(hits: &[SearchHit]) -> Vec<ResourceLink> {
    hits.iter()
        .filter(|hit| hit.link.starts_with("http"))
        .map(|hit| ResourceLink {
            title: clean_title(&hit.title),
            url: hit.link.clone(),
            source_name: source_name(&hit.link),
        })
        .collect()
}

fn render_links(links: &[ResourceLink]) -> String {
    let mut section = format!("{RESOURCE_LINKS_HEADING}\n\n");
    for link in links {
        let _ = writeln!(section, "- [{}]({}) - {}", link.title, link.url, link.source_name);
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::search_hit;

    fn sample_hits() -> Vec<SearchHit> {
        vec![
            search_hit(
                "THE 15 BEST Things to Do in Lisbon | Tripadvisor",
                "https://www.tripadvisor.com/Attractions-g189158",
                "Lisbon is a city of  hills, trams and tiled façades.",
            ),
            search_hit(
                "Lisbon travel • Lonely Planet | Portugal",
                "https://www.lonelyplanet.com/portugal/lisbon",
                "Europe's sunniest capital.",
            ),
            search_hit(
                "Two days in Lisbon",
                "https://blog.nomadicmatt.com/lisbon",
                "Matt's itinerary.",
            ),
            search_hit("Forum thread", "ftp://files.example.org/x", "ignored link"),
        ]
    }

    #[test]
    fn empty_hits_give_fallback_document() {
        let doc = SearchResultFormatter::new().format_insights(&[], "Lisbon");
        assert!(doc.contains("Tripadvisor Travel Guide"));
        assert!(doc.contains(RESOURCE_LINKS_HEADING));
        assert!(doc.contains("## Best Time to Visit"));
        assert_eq!(doc, fallback_insights("Lisbon"));
    }

    #[test]
    fn numbered_subsections_keep_snippets_verbatim() {
        let doc = SearchResultFormatter::new().format_insights(&sample_hits(), "Lisbon");

        assert!(doc.starts_with("# Traveler Insights for Lisbon"));
        assert!(doc.contains("### 1. THE 15 BEST Things to Do in Lisbon\n"));
        assert!(doc.contains("### 2. Lisbon travel\n"));
        assert!(doc.contains("### 3. Two days in Lisbon\n"));
        assert!(doc.contains("Lisbon is a city of  hills, trams and tiled façades.\n"));
        assert!(doc.contains("*Source: Tripadvisor*"));
        assert!(doc.contains("## Local Experiences"));
        assert!(doc.contains("## Travel Tips"));
    }

    #[test]
    fn resource_section_lists_http_links_in_order() {
        let doc = SearchResultFormatter::new().format_insights(&sample_hits(), "Lisbon");
        let (_, links) = doc.split_once(RESOURCE_LINKS_HEADING).unwrap();
        let lines: Vec<&str> = links.lines().filter(|l| l.starts_with("- [")).collect();

        assert_eq!(
            lines,
            vec![
                "- [THE 15 BEST Things to Do in Lisbon](https://www.tripadvisor.com/Attractions-g189158) - Tripadvisor",
                "- [Lisbon travel](https://www.lonelyplanet.com/portugal/lisbon) - Lonely Planet",
                "- [Two days in Lisbon](https://blog.nomadicmatt.com/lisbon) - Blog",
            ]
        );
    }

    #[test]
    fn source_names_from_hosts() {
        assert_eq!(source_name("https://www.booking.com/city/pt/lisbon"), "Booking.com");
        assert_eq!(source_name("https://uk.expedia.co.uk/x"), "Expedia");
        assert_eq!(source_name("https://wikitravel.org/en/Lisbon"), "Wikitravel");
        assert_eq!(source_name("https://www.visitlisboa.com/en"), "Visitlisboa");
        assert_eq!(source_name("not a url"), "Unknown Source");
        assert_eq!(source_name(""), "Unknown Source");
    }

    #[test]
    fn clean_title_keeps_unsuffixed_titles() {
        assert_eq!(clean_title("  Plain title "), "Plain title");
        assert_eq!(clean_title("Guide | Site | Section"), "Guide");
        assert_eq!(clean_title("Pipe|without spaces"), "Pipe|without spaces");
    }

    #[test]
    fn formatting_is_idempotent() {
        let formatter = SearchResultFormatter::new();
        let hits = sample_hits();
        assert_eq!(
            formatter.format_insights(&hits, "Lisbon"),
            formatter.format_insights(&hits, "Lisbon")
        );
    }
}
