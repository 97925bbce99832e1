//! Vietnamese Wiktionary lookup CLI.
//!
//! Interactive companion tool: reads English words from stdin, fetches the
//! vi.wiktionary.org page extract, and prints IPA pronunciations and
//! per-part-of-speech meanings with colored output.
//!
//! The extraction is best-effort text scraping of rendered wiki HTML; when
//! the page layout does not match, the tool prints a notice and moves on.

use anyhow::{Context, Result};
use colored::Colorize;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// MediaWiki extract endpoint of the Vietnamese Wiktionary.
const WIKTIONARY_API: &str = "https://vi.wiktionary.org/w/api.php";

/// Section anchors of the part-of-speech headings, with display labels.
const PARTS_OF_SPEECH: &[(&str, &str)] = &[
    ("Tính_từ", "Tính từ"),
    ("Danh_từ", "Danh từ"),
    ("Trạng_từ", "Trạng từ"),
    ("Động_từ", "Động từ"),
    ("Giới_từ", "Giới từ"),
    ("Liên_từ", "Liên từ"),
    ("Đại_từ", "Đại từ"),
    ("Thán_từ", "Thán từ"),
    ("Phó_từ", "Phó từ"),
    ("Mạo_từ", "Mạo từ"),
];

/// Anchor of the pronunciation heading.
const PRONUNCIATION_ANCHOR: &str = "Cách_phát_âm";

/// Anchor of the English-language section heading.
const ENGLISH_ANCHOR: &str = "Tiếng_Anh";

/// Everything extracted from one wiki page.
#[derive(Debug, Default, PartialEq)]
struct WikiEntry {
    /// IPA transcriptions, in page order.
    pronunciations: Vec<String>,

    /// Part-of-speech sections, in page order.
    sections: Vec<PartSection>,
}

/// Meanings under one part-of-speech heading.
#[derive(Debug, PartialEq)]
struct PartSection {
    /// Display label (e.g., "Danh từ").
    label: String,

    /// Meaning lines, in page order.
    meanings: Vec<String>,
}

impl WikiEntry {
    fn is_empty(&self) -> bool {
        self.pronunciations.is_empty() && self.sections.is_empty()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wiki_lookup=info")),
        )
        .init();

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")?;

    println!(
        "\n{}",
        "Vietnamese Wiktionary Lookup".bright_cyan().bold()
    );
    println!(
        "{}\n",
        "Type an English word, or 'quit' to exit".bright_yellow()
    );

    let stdin = std::io::stdin();
    loop {
        print!("{} ", "word>".bright_green().bold());
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        if word.eq_ignore_ascii_case("quit") || word.eq_ignore_ascii_case("exit") {
            break;
        }

        match fetch_extract(&client, word).await {
            Ok(Some(html)) => print_entry(word, &parse_extract(&html)),
            Ok(None) => println!("{}", "No entry found on Wiktionary.".bright_red()),
            Err(e) => println!("{} {:#}", "Could not reach Wiktionary:".bright_red(), e),
        }
    }

    println!("{}", "Goodbye!".bright_cyan());
    Ok(())
}

/// Fetches the rendered HTML extract for a page, or `None` when the page
/// does not exist or has no extract.
async fn fetch_extract(client: &reqwest::Client, word: &str) -> Result<Option<String>> {
    let response = client
        .get(WIKTIONARY_API)
        .query(&[
            ("action", "query"),
            ("format", "json"),
            ("prop", "extracts"),
            ("titles", word),
        ])
        .send()
        .await
        .context("Failed to send request to Wiktionary API")?;

    if !response.status().is_success() {
        anyhow::bail!("Wiktionary API returned status: {}", response.status());
    }

    let body: Value = response
        .json()
        .await
        .context("Failed to parse Wiktionary API response")?;

    let extract = body
        .get("query")
        .and_then(|q| q.get("pages"))
        .and_then(Value::as_object)
        .and_then(|pages| pages.values().next())
        .and_then(|page| page.get("extract"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    Ok(extract)
}

/// Extracts pronunciations and part-of-speech sections from the
/// English-language portion of a page extract.
fn parse_extract(html: &str) -> WikiEntry {
    let doc = Html::parse_fragment(html);
    let h2 = Selector::parse("h2").expect("static selector");

    let Some(english) = doc
        .select(&h2)
        .find(|el| el.value().attr("data-mw-anchor") == Some(ENGLISH_ANCHOR))
    else {
        return WikiEntry::default();
    };

    // Elements between the English heading and the next language heading
    let body: Vec<ElementRef> = english
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| el.value().name() != "h2")
        .collect();

    let mut entry = WikiEntry::default();
    for (index, element) in body.iter().enumerate() {
        if element.value().name() != "h3" {
            continue;
        }
        let Some(anchor) = element.value().attr("data-mw-anchor") else {
            continue;
        };

        if anchor == PRONUNCIATION_ANCHOR {
            entry.pronunciations = extract_pronunciations(&body[index + 1..]);
        } else if let Some((_, label)) = PARTS_OF_SPEECH.iter().find(|(a, _)| *a == anchor) {
            let meanings = extract_meanings(&body[index + 1..]);
            if !meanings.is_empty() {
                entry.sections.push(PartSection {
                    label: (*label).to_string(),
                    meanings,
                });
            }
        }
    }

    entry
}

/// Reads IPA transcriptions from the first list following the
/// pronunciation heading.
fn extract_pronunciations(rest: &[ElementRef]) -> Vec<String> {
    let span = Selector::parse("span").expect("static selector");

    let Some(list) = section_content(rest, "ul") else {
        return Vec::new();
    };

    list_items(list)
        .filter(|li| li.text().collect::<String>().contains("IPA"))
        .filter_map(|li| {
            li.select(&span)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
        })
        .filter(|ipa| !ipa.is_empty())
        .collect()
}

/// Reads meaning lines for one part-of-speech section: the items of the
/// first ordered list, or the first paragraph when there is no list.
fn extract_meanings(rest: &[ElementRef]) -> Vec<String> {
    if let Some(list) = section_content(rest, "ol") {
        return list_items(list)
            .map(|li| collapse_whitespace(&li.text().collect::<String>()))
            .filter(|meaning| !meaning.is_empty())
            .collect();
    }

    if let Some(paragraph) = section_content(rest, "p") {
        let text = collapse_whitespace(&paragraph.text().collect::<String>());
        if !text.is_empty() {
            return vec![text];
        }
    }

    Vec::new()
}

/// First element of the wanted tag before the next heading.
fn section_content<'a>(rest: &[ElementRef<'a>], tag: &str) -> Option<ElementRef<'a>> {
    rest.iter()
        .take_while(|el| !matches!(el.value().name(), "h2" | "h3"))
        .find(|el| el.value().name() == tag)
        .copied()
}

/// Direct `<li>` children of a list element.
fn list_items<'a>(list: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "li")
}

/// Collapses runs of whitespace (wiki HTML is full of newlines).
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn print_entry(word: &str, entry: &WikiEntry) {
    if entry.is_empty() {
        println!(
            "{}",
            "No English section found for this word.".bright_red()
        );
        return;
    }

    println!("\n{} {}", "Word:".bright_yellow(), word.to_uppercase().bright_green().bold());

    if !entry.pronunciations.is_empty() {
        println!("\n{}", "Pronunciation (IPA):".bright_yellow());
        for ipa in &entry.pronunciations {
            println!("  {}", ipa.bright_magenta());
        }
    }

    for section in &entry.sections {
        println!("\n{}", section.label.bright_cyan().bold());
        for (i, meaning) in section.meanings.iter().enumerate() {
            println!("  {}. {}", i + 1, meaning);
        }
    }
    println!();
}
