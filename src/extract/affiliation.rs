//! Affiliation text → family relationship.
//!
//! Owner pages describe relatives in free text such as
//! `"Jane Doe – wife of the owner, director of Acme"`. The parser splits the
//! text into the relative's name and a description, then classifies the tie
//! by whole-word keywords.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::RelationType;

/// Names shorter than this are treated as noise.
const MIN_NAME_CHARS: usize = 3;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").expect("Invalid regex pattern"));

const SPOUSE_WORDS: &[&str] = &["wife", "husband", "spouse"];
const CHILD_WORDS: &[&str] = &["son", "sons", "daughter", "daughters", "child", "children"];
const SIBLING_WORDS: &[&str] = &["brother", "brothers", "sister", "sisters", "sibling", "siblings"];
const PARENT_WORDS: &[&str] = &["father", "mother", "parent", "parents"];

/// The relative named in an affiliation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub name: String,
    pub description: String,
}

/// Classified affiliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affiliation {
    Spouse(Mention),
    Child(Mention),
    Sibling(Mention),
    Parent(Mention),
    FamilyRelation(Mention),
    Unrecognized,
}

impl Affiliation {
    pub fn relation_type(&self) -> Option<RelationType> {
        match self {
            Affiliation::Spouse(_) => Some(RelationType::Spouse),
            Affiliation::Child(_) => Some(RelationType::Child),
            Affiliation::Sibling(_) => Some(RelationType::Sibling),
            Affiliation::Parent(_) => Some(RelationType::Parent),
            Affiliation::FamilyRelation(_) => Some(RelationType::FamilyRelation),
            Affiliation::Unrecognized => None,
        }
    }

    pub fn mention(&self) -> Option<&Mention> {
        match self {
            Affiliation::Spouse(m)
            | Affiliation::Child(m)
            | Affiliation::Sibling(m)
            | Affiliation::Parent(m)
            | Affiliation::FamilyRelation(m) => Some(m),
            Affiliation::Unrecognized => None,
        }
    }
}

/// Turns one block of affiliation text into an [`Affiliation`].
pub trait AffiliationParser {
    fn parse(&self, text: &str) -> Affiliation;
}

/// Dash/sentence splitting plus keyword classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordAffiliationParser;

impl KeywordAffiliationParser {
    /// Split into `(name, description)`: en dash first, then hyphen, then the
    /// first sentence.
    fn split(text: &str) -> (String, String) {
        for separator in [" – ", " - "] {
            if let Some((name, rest)) = text.split_once(separator) {
                return (name.trim().to_string(), rest.trim().to_string());
            }
        }
        match text.split_once('.') {
            Some((name, rest)) => (name.trim().to_string(), rest.trim().to_string()),
            None => (text.trim().to_string(), String::new()),
        }
    }

    fn classify(description: &str) -> RelationType {
        let words: Vec<String> = WORD
            .find_iter(description)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        let has_any = |table: &[&str]| words.iter().any(|w| table.contains(&w.as_str()));

        if has_any(SPOUSE_WORDS) {
            RelationType::Spouse
        } else if has_any(CHILD_WORDS) {
            RelationType::Child
        } else if has_any(SIBLING_WORDS) {
            RelationType::Sibling
        } else if has_any(PARENT_WORDS) {
            RelationType::Parent
        } else {
            RelationType::FamilyRelation
        }
    }
}

impl AffiliationParser for KeywordAffiliationParser {
    fn parse(&self, text: &str) -> Affiliation {
        let (name, description) = Self::split(text);
        if name.chars().count() < MIN_NAME_CHARS {
            return Affiliation::Unrecognized;
        }

        let relation_type = Self::classify(&description);
        let mention = Mention { name, description };
        match relation_type {
            RelationType::Spouse => Affiliation::Spouse(mention),
            RelationType::Child => Affiliation::Child(mention),
            RelationType::Sibling => Affiliation::Sibling(mention),
            RelationType::Parent => Affiliation::Parent(mention),
            _ => Affiliation::FamilyRelation(mention),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Affiliation {
        KeywordAffiliationParser.parse(text)
    }

    #[test]
    fn test_en_dash_split() {
        let parsed = parse("Jane Doe – wife of the owner, director of Acme");
        assert_eq!(
            parsed,
            Affiliation::Spouse(Mention {
                name: "Jane Doe".to_string(),
                description: "wife of the owner, director of Acme".to_string(),
            })
        );
    }

    #[test]
    fn test_hyphen_split() {
        let parsed = parse("John Doe Jr. - eldest son, chairman");
        assert_eq!(parsed.relation_type(), Some(RelationType::Child));
        assert_eq!(parsed.mention().unwrap().name, "John Doe Jr.");
    }

    #[test]
    fn test_en_dash_wins_over_hyphen() {
        let parsed = parse("Anne-Marie Silva – sister - board member");
        assert_eq!(parsed.mention().unwrap().name, "Anne-Marie Silva");
        assert_eq!(parsed.relation_type(), Some(RelationType::Sibling));
    }

    #[test]
    fn test_sentence_split() {
        let parsed = parse("Ravi Perera. His father founded the group.");
        let mention = parsed.mention().unwrap();
        assert_eq!(mention.name, "Ravi Perera");
        assert_eq!(mention.description, "His father founded the group.");
        assert_eq!(parsed.relation_type(), Some(RelationType::Parent));
    }

    #[test]
    fn test_whole_word_matching() {
        // "person" and "grandson" must not read as "son"
        let parsed = parse("Kumar Singh – business person, associate");
        assert_eq!(parsed.relation_type(), Some(RelationType::FamilyRelation));
        let parsed = parse("Kumar Singh – grandsonship pending");
        assert_eq!(parsed.relation_type(), Some(RelationType::FamilyRelation));
    }

    #[test]
    fn test_precedence_spouse_first() {
        let parsed = parse("Maria Lopez – wife, and mother of two");
        assert_eq!(parsed.relation_type(), Some(RelationType::Spouse));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(parse(""), Affiliation::Unrecognized);
        assert_eq!(parse("Al – brother"), Affiliation::Unrecognized);
        assert_eq!(parse("   "), Affiliation::Unrecognized);
        assert!(parse("").mention().is_none());
    }
}
