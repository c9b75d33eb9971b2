//! Owner page extraction.
//!
//! Pages follow the layout of the Media Ownership Monitor owner detail
//! pages: an `h1.hl1` title, a `div.box` with a `div.text` description, a
//! `figure.media.owner` portrait, `div.subtitle.box` section headings each
//! followed by `div.teaser.company` cards, and an accordion `div.item`
//! titled "Family & Friends".

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::OwnergraphError;
use crate::model::{parse_percentage, Entity, EntityKind};

const COMPANIES_HEADING: &str = "Media Companies / Groups";
const OUTLETS_HEADING: &str = "Media Outlets";
const FAMILY_HEADING: &str = "Family & Friends";
const AFFILIATED_HEADING: &str = "Affiliated Interests";

const UNKNOWN_OWNER: &str = "Unknown Owner";
const UNKNOWN_COMPANY: &str = "Unknown Company";
const UNKNOWN_OUTLET: &str = "Unknown Outlet";
const UNKNOWN_MEDIA_TYPE: &str = "unknown";

// Safety: every selector below is a compile-time constant with valid CSS
// syntax, so `Selector::parse` cannot fail.
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Invalid CSS selector")
}

static OWNER_TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.hl1"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static BOX: Lazy<Selector> = Lazy::new(|| selector("div.box"));
static TEXT_DIV: Lazy<Selector> = Lazy::new(|| selector("div.text"));
static OWNER_FIGURE_IMG: Lazy<Selector> = Lazy::new(|| selector("figure.media.owner img"));
static SECTION_OR_TEASER: Lazy<Selector> =
    Lazy::new(|| selector("div.subtitle.box, div.teaser.company"));
static SECTION_LABEL: Lazy<Selector> = Lazy::new(|| selector("span.hl2"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));
static TEASER_NAME: Lazy<Selector> = Lazy::new(|| selector("strong.hl4"));
static PERCENTAGE: Lazy<Selector> = Lazy::new(|| selector("div.percentage"));
static MEDIA_TYPE: Lazy<Selector> = Lazy::new(|| selector("div.mediatype"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static ITEM: Lazy<Selector> = Lazy::new(|| selector("div.item"));
static ITEM_TITLE: Lazy<Selector> = Lazy::new(|| selector("h3.hl3"));
static ITEM_SUBTITLE: Lazy<Selector> = Lazy::new(|| selector("h4.hl4"));

/// A company or outlet card with the owner's stake in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub entity: Entity,
    pub percentage: f64,
}

/// Everything extracted from one owner page.
#[derive(Debug, Default)]
pub struct OwnerPage {
    pub owner: Option<Entity>,
    pub holdings: Vec<Holding>,
    /// Raw affiliation texts from the family section, in page order.
    pub affiliations: Vec<String>,
    /// Recoverable problems, e.g. unreadable percentages (stored as 0).
    pub issues: Vec<OwnergraphError>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Companies,
    Outlets,
    Other,
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse one owner page. Never fails: missing parts fall back to defaults
/// and unreadable values are reported in [`OwnerPage::issues`].
pub fn parse_owner_page(html: &str) -> OwnerPage {
    let document = Html::parse_document(html);
    let mut page = OwnerPage::default();

    let mut owner = Entity::owner(owner_name(&document));
    owner.description = Some(owner_description(&document));
    owner.image_url = non_empty(owner_image(&document));
    page.owner = Some(owner);

    let mut section = Section::Other;
    for element in document.select(&SECTION_OR_TEASER) {
        if element.value().classes().any(|c| c == "subtitle") {
            section = classify_section(element);
            continue;
        }
        match section {
            Section::Companies => {
                if let Some(holding) = parse_teaser(element, EntityKind::Company, &mut page.issues) {
                    page.holdings.push(holding);
                }
            }
            Section::Outlets => {
                if let Some(holding) = parse_teaser(element, EntityKind::MediaOutlet, &mut page.issues) {
                    page.holdings.push(holding);
                }
            }
            Section::Other => {
                log::debug!("Ignoring teaser outside a holdings section");
            }
        }
    }

    page.affiliations = affiliation_texts(&document);
    page
}

fn owner_name(document: &Html) -> String {
    if let Some(h1) = document.select(&OWNER_TITLE).next() {
        let name = text_of(h1);
        if !name.is_empty() {
            return name;
        }
    }
    if let Some(title) = document.select(&TITLE).next() {
        let text = text_of(title);
        let name = text.split('|').next().unwrap_or("").trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    UNKNOWN_OWNER.to_string()
}

fn owner_description(document: &Html) -> String {
    document
        .select(&BOX)
        .next()
        .and_then(|b| b.select(&TEXT_DIV).next())
        .map(text_of)
        .unwrap_or_default()
}

fn owner_image(document: &Html) -> String {
    document
        .select(&OWNER_FIGURE_IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or("")
        .to_string()
}

fn classify_section(heading: ElementRef<'_>) -> Section {
    let label = heading
        .select(&SECTION_LABEL)
        .next()
        .map(text_of)
        .unwrap_or_default();
    if label.contains(COMPANIES_HEADING) {
        Section::Companies
    } else if label.contains(OUTLETS_HEADING) {
        Section::Outlets
    } else {
        Section::Other
    }
}

fn parse_teaser(
    teaser: ElementRef<'_>,
    kind: EntityKind,
    issues: &mut Vec<OwnergraphError>,
) -> Option<Holding> {
    // Cards without a link are placeholders.
    teaser.select(&LINK).next()?;

    let fallback = match kind {
        EntityKind::MediaOutlet => UNKNOWN_OUTLET,
        _ => UNKNOWN_COMPANY,
    };
    let name = teaser
        .select(&TEASER_NAME)
        .next()
        .map(text_of)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback.to_string());

    let mut entity = Entity::new(name, kind);
    entity.image_url = teaser
        .select(&IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
        .and_then(non_empty);

    if kind == EntityKind::MediaOutlet {
        let media_type = teaser
            .select(&MEDIA_TYPE)
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_MEDIA_TYPE.to_string());
        entity.media_type = Some(media_type.to_lowercase());
    }

    let percentage = match teaser.select(&PERCENTAGE).next().map(text_of) {
        Some(text) => match parse_percentage(&text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {} (using 0)", entity.name, e);
                issues.push(e);
                0.0
            }
        },
        None => 0.0,
    };

    Some(Holding { entity, percentage })
}

/// Texts of the "Affiliated Interests" and follow-up items inside the
/// "Family & Friends" accordion item.
fn affiliation_texts(document: &Html) -> Vec<String> {
    let family = document.select(&ITEM).find(|item| {
        item.select(&ITEM_TITLE)
            .next()
            .map(|h3| text_of(h3).contains(FAMILY_HEADING))
            .unwrap_or(false)
    });
    let Some(family) = family else {
        return Vec::new();
    };

    let mut texts = Vec::new();
    for item in family.select(&ITEM) {
        if item.id() == family.id() {
            continue;
        }
        let affiliated = item
            .select(&ITEM_SUBTITLE)
            .next()
            .map(|h4| text_of(h4).contains(AFFILIATED_HEADING))
            .unwrap_or(false);
        let follow = item.value().classes().any(|c| c == "follow");
        if !(affiliated || follow) {
            continue;
        }
        if let Some(text_div) = item.select(&TEXT_DIV).next() {
            let text = text_of(text_div);
            if !text.is_empty() {
                texts.push(text);
            }
        }
    }
    texts
}
