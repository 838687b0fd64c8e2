//! Address formatting and canonical keys
//!
//! Display formatting and stop identity are kept apart: [`format_address`] is
//! what the driver sees and what geocoders receive, [`canonical_key`] decides
//! which packages share a stop.

use crate::types::Address;

/// Display form: "12 Rue Royale, 74000 Annecy, France"
pub fn format_address(address: &Address) -> String {
    let street = join_non_empty(&[&address.street_number, &address.street_name], " ");
    let locality = join_non_empty(&[&address.postal_code, &address.city], " ");
    join_non_empty(&[&street, &locality, address.country.trim()], ", ")
}

/// Stop identity key built from street number, street name, postal code and city.
///
/// Country and coordinates are not part of the key. Each field goes through
/// [`normalize_component`], so whitespace, case and punctuation drift do not
/// split one address into two stops.
pub fn canonical_key(address: &Address) -> String {
    [
        &address.street_number,
        &address.street_name,
        &address.postal_code,
        &address.city,
    ]
    .iter()
    .map(|field| normalize_component(field))
    .collect::<Vec<_>>()
    .join("|")
}

/// Trim, case-fold, drop punctuation and collapse inner whitespace.
///
/// Diacritics are preserved: "Genève" and "Geneve" stay distinct.
pub fn normalize_component(value: &str) -> String {
    let folded: String = value
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_non_empty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(number: &str, street: &str, postal: &str, city: &str) -> Address {
        Address::new(number, street, postal, city, "France")
    }

    #[test]
    fn test_format_address() {
        let a = address("12", "Rue Royale", "74000", "Annecy");
        assert_eq!(format_address(&a), "12 Rue Royale, 74000 Annecy, France");
    }

    #[test]
    fn test_format_address_skips_empty_parts() {
        let a = Address::new("", "Place des Romains", "74000", "Annecy", "");
        assert_eq!(format_address(&a), "Place des Romains, 74000 Annecy");
    }

    #[test]
    fn test_normalize_component() {
        assert_eq!(normalize_component("  Rue   Royale "), "rue royale");
        assert_eq!(normalize_component("Av. de l'Europe"), "av de l europe");
        assert_eq!(normalize_component("12-BIS"), "12 bis");
        assert_eq!(normalize_component(""), "");
    }

    #[test]
    fn test_normalize_keeps_diacritics() {
        assert_eq!(normalize_component("GENÈVE"), "genève");
        assert_ne!(normalize_component("Genève"), normalize_component("Geneve"));
    }

    #[test]
    fn test_canonical_key_ignores_case_whitespace_punctuation() {
        let a = address("12", "Rue Royale", "74000", "Annecy");
        let b = address(" 12 ", "rue  royale.", "74000", "ANNECY");
        assert_eq!(canonical_key(&a), canonical_key(&b));
    }

    #[test]
    fn test_canonical_key_ignores_country_and_coordinates() {
        let a = address("12", "Rue Royale", "74000", "Annecy");
        let mut b = Address::new("12", "Rue Royale", "74000", "Annecy", "FR");
        b.coordinates = Some(crate::types::Coordinates { lat: 45.9, lng: 6.12 });
        assert_eq!(canonical_key(&a), canonical_key(&b));
    }

    #[test]
    fn test_canonical_key_distinguishes_numbers_and_fields() {
        let a = address("12", "Rue Royale", "74000", "Annecy");
        let b = address("14", "Rue Royale", "74000", "Annecy");
        assert_ne!(canonical_key(&a), canonical_key(&b));

        // Field boundaries are kept: moving text between fields changes the key
        let c = address("1", "2 Rue Royale", "74000", "Annecy");
        let d = address("1 2", "Rue Royale", "74000", "Annecy");
        assert_ne!(canonical_key(&c), canonical_key(&d));
    }
}
