//! Filler text for synthetic entities

use rand::seq::SliceRandom;
use rand::Rng;

const WORDS: &[&str] = &[
    "advise", "agreement", "capacity", "checkpoint", "command", "coordinate", "council",
    "district", "engage", "evaluate", "facility", "finance", "governance", "liaison",
    "logistics", "meeting", "mentor", "ministry", "mission", "network", "oversight",
    "partner", "patrol", "planning", "procurement", "province", "readiness", "reform",
    "review", "security", "staff", "supply", "support", "training", "transition",
];

const COMPANY_WORDS: &[&str] = &[
    "Atlas", "Beacon", "Cedar", "Delta", "Harbor", "Keystone", "Meridian", "Northwind",
    "Orion", "Pinnacle", "Ridge", "Summit", "Vanguard", "Westfield",
];

const COMPANY_SUFFIXES: &[&str] = &["Group", "Partners", "and Sons", "Holdings", "Consulting", "Logistics"];

const JOB_LEVELS: &[&str] = &["Senior", "Chief", "Deputy", "Lead", "Principal", "Assistant"];

const JOB_AREAS: &[&str] = &[
    "Operations", "Logistics", "Finance", "Training", "Intelligence", "Communications",
    "Infrastructure", "Personnel",
];

const JOB_TYPES: &[&str] = &["Advisor", "Officer", "Coordinator", "Director", "Analyst", "Liaison"];

pub const FIRST_NAMES: &[&str] = &[
    "Ahmad", "Aisha", "Bilal", "Chris", "Dana", "Farid", "Hamid", "Jordan", "Karim", "Laila",
    "Mariam", "Nadia", "Omar", "Rahim", "Sam", "Tariq", "Yusuf", "Zahra",
];

pub const SURNAMES: &[&str] = &[
    "ACHAKZAI", "AFGHAN", "AFGHANZADA", "AHMADZAI", "AKHTAR", "ALAKOZAI", "ALAM", "AMIN",
    "ANSARI", "BARAKZAI", "DURRANI", "HAIDARI", "KARIMI", "NOORI", "POPALZAI", "RAHIMI",
    "SADAT", "STANEKZAI", "WARDAK", "ZAZAI",
];

pub const RANKS: &[&str] = &["CIV", "CTR", "OR-7", "OF-2", "OF-4", "OF-6"];

fn pick<R: Rng + ?Sized>(rng: &mut R, from: &'static [&'static str]) -> &'static str {
    from.choose(rng).copied().unwrap_or_default()
}

/// A sentence of a few words
pub fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(4..=10);
    let mut words: Vec<&str> = (0..len).map(|_| pick(rng, WORDS)).collect();
    let mut first = words.remove(0).to_string();
    if let Some(initial) = first.get_mut(..1) {
        initial.make_ascii_uppercase();
    }
    words.insert(0, &first);
    format!("{}.", words.join(" "))
}

/// A few sentences
pub fn paragraph<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(3..=6);
    (0..len).map(|_| sentence(rng)).collect::<Vec<_>>().join(" ")
}

/// A few paragraphs separated by blank lines
pub fn paragraphs<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(2..=4);
    (0..len).map(|_| paragraph(rng)).collect::<Vec<_>>().join("\n\n")
}

/// Something like "Meridian Holdings"
pub fn company_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, COMPANY_WORDS), pick(rng, COMPANY_SUFFIXES))
}

/// Something like "Senior Logistics Officer"
pub fn job_title<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {} {}",
        pick(rng, JOB_LEVELS),
        pick(rng, JOB_AREAS),
        pick(rng, JOB_TYPES)
    )
}

/// Person name in the "SURNAME, Given" form the API uses
pub fn person_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}, {}", pick(rng, SURNAMES), pick(rng, FIRST_NAMES))
}

/// A lowercase login name with a numeric suffix
pub fn user_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}.{}{}",
        pick(rng, FIRST_NAMES).to_lowercase(),
        pick(rng, SURNAMES).to_lowercase(),
        rng.gen_range(1..1000)
    )
}

/// Hyphenated lowercase words, for codes
pub fn slug<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..3).map(|_| pick(rng, WORDS)).collect::<Vec<_>>().join("-")
}

/// `len` random uppercase letters
pub fn letters<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.gen_range(b'A'..=b'Z'))).collect()
}

/// Initials of a company name, skipping "and"
///
/// "Smith and Johnson" becomes "SJ".
#[must_use]
pub fn abbreviate(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty() && *w != "and")
        .filter_map(|w| w.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn abbreviate_skips_and() {
        assert_eq!(abbreviate("Smith and Johnson"), "SJ");
        assert_eq!(abbreviate("Atlas & Ridge Holdings"), "ARH");
    }

    #[test]
    fn sentence_is_capitalised_and_terminated() {
        let mut rng = StdRng::seed_from_u64(11);
        let s = sentence(&mut rng);
        assert!(s.ends_with('.'));
        assert!(s.chars().next().is_some_and(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn letters_are_uppercase() {
        let mut rng = StdRng::seed_from_u64(5);
        let code = letters(&mut rng, 6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase()));
    }
}
