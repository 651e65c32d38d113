//! District name canonicalization.
//!
//! Every loader (baseline, coordinates, history, boundary map) passes names
//! through [`canonical_district_name`] so that joins between sources compare
//! like with like.

/// Known spellings in the boundary and gridded sources, mapped to the
/// baseline spelling. Keys are matched after whitespace normalisation.
const ALIASES: &[(&str, &str)] = &[
    ("Jakobabad", "Jacobabad"),
    ("Attok", "Attock"),
    ("Mirphurkhas", "Mirpur Khas"),
    ("Dera Ghazi Kha", "Dera Ghazi Khan"),
    ("M. B. Din", "Mandi Bahauddin"),
    ("Tando M. Khan", "Tando Muhammad Khan"),
    ("Gujarat", "Gujrat"),
    ("Karachi west", "Karachi West"),
    ("Gujranwala 1", "Gujranwala"),
    ("Gujranwala 2", "Gujranwala"),
    ("Narowal 1", "Narowal"),
    ("Narowal 2", "Narowal"),
    ("Okara 1", "Okara"),
    ("Malakand P.A.", "Malakand"),
    ("N. Waziristan", "North Waziristan"),
    ("S. Waziristan", "South Waziristan"),
    ("Adam Khel", "Kohat"),
    ("Bhitani", "Lakki Marwat"),
    ("Largha Shirani", "Sherani"),
];

/// Trim, collapse runs of whitespace, resolve known aliases (ignoring case),
/// then title-case.
pub fn canonical_district_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let resolved = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(&collapsed))
        .map(|(_, name)| *name)
        .unwrap_or(collapsed.as_str());
    title_case(resolved)
}

/// First letter of every alphabetic run upper-cased, the rest lower-cased.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
