use std::collections::HashMap;
use std::fmt;

use geojson::JsonValue;

use crate::map::feature::{GeoFeature, PropertyBag};

/// Natural Earth "no data" marker
pub const NO_DATA: &str = "-99";

/// Property keys probed for an identifier, highest priority first
pub const IDENTITY_KEYS: [&str; 10] = [
    "iso_a3", "ISO_A3", "adm0_a3", "ADM0_A3", "sov_a3", "brk_a3", "ISO3", "iso3", "iso_a2", "ISO_A2",
];

/// Alpha-3 to alpha-2 for every country the quiz knows
const ALPHA3_TO_ALPHA2: &[(&str, &str)] = &[
    // South America
    ("ARG", "AR"), ("BOL", "BO"), ("BRA", "BR"), ("CHL", "CL"), ("COL", "CO"), ("ECU", "EC"),
    ("GUY", "GY"), ("PRY", "PY"), ("PER", "PE"), ("SUR", "SR"), ("URY", "UY"), ("VEN", "VE"),
    // North America and the Caribbean
    ("ATG", "AG"), ("BHS", "BS"), ("BRB", "BB"), ("BLZ", "BZ"), ("CAN", "CA"), ("CRI", "CR"),
    ("CUB", "CU"), ("DMA", "DM"), ("DOM", "DO"), ("SLV", "SV"), ("GRD", "GD"), ("GTM", "GT"),
    ("HTI", "HT"), ("HND", "HN"), ("JAM", "JM"), ("MEX", "MX"), ("NIC", "NI"), ("PAN", "PA"),
    ("KNA", "KN"), ("LCA", "LC"), ("VCT", "VC"), ("TTO", "TT"), ("USA", "US"),
    // Europe
    ("ALB", "AL"), ("AND", "AD"), ("BEL", "BE"), ("BIH", "BA"), ("BGR", "BG"), ("CYP", "CY"),
    ("DNK", "DK"), ("DEU", "DE"), ("EST", "EE"), ("FIN", "FI"), ("FRA", "FR"), ("GRC", "GR"),
    ("HUN", "HU"), ("IRL", "IE"), ("ISL", "IS"), ("ITA", "IT"), ("HRV", "HR"), ("LVA", "LV"),
    ("LIE", "LI"), ("LTU", "LT"), ("LUX", "LU"), ("MLT", "MT"), ("MDA", "MD"), ("MCO", "MC"),
    ("MNE", "ME"), ("NLD", "NL"), ("MKD", "MK"), ("NOR", "NO"), ("UKR", "UA"), ("AUT", "AT"),
    ("POL", "PL"), ("PRT", "PT"), ("ROU", "RO"), ("RUS", "RU"), ("SMR", "SM"), ("SRB", "RS"),
    ("SVK", "SK"), ("SVN", "SI"), ("ESP", "ES"), ("CZE", "CZ"), ("VAT", "VA"), ("GBR", "GB"),
    ("BLR", "BY"), ("CHE", "CH"), ("XKX", "XK"),
    // Oceania
    ("AUS", "AU"), ("FJI", "FJ"), ("KIR", "KI"), ("MHL", "MH"), ("FSM", "FM"), ("NRU", "NR"),
    ("NZL", "NZ"), ("PLW", "PW"), ("PNG", "PG"), ("SLB", "SB"), ("WSM", "WS"), ("TON", "TO"),
    ("TUV", "TV"), ("VUT", "VU"),
    // Africa
    ("DZA", "DZ"), ("EGY", "EG"), ("LBY", "LY"), ("TUN", "TN"), ("MAR", "MA"), ("SDN", "SD"),
    ("SSD", "SS"), ("ETH", "ET"), ("ERI", "ER"), ("DJI", "DJ"), ("SOM", "SO"), ("NGA", "NG"),
    ("GHA", "GH"), ("CIV", "CI"), ("SEN", "SN"), ("GMB", "GM"), ("GIN", "GN"), ("GNB", "GW"),
    ("SLE", "SL"), ("LBR", "LR"), ("BEN", "BJ"), ("TGO", "TG"), ("CMR", "CM"), ("CAF", "CF"),
    ("TCD", "TD"), ("COG", "CG"), ("COD", "CD"), ("GNQ", "GQ"), ("GAB", "GA"), ("STP", "ST"),
    ("AGO", "AO"), ("NAM", "NA"), ("ZMB", "ZM"), ("ZWE", "ZW"), ("MOZ", "MZ"), ("MWI", "MW"),
    ("TZA", "TZ"), ("KEN", "KE"), ("UGA", "UG"), ("RWA", "RW"), ("BDI", "BI"), ("ZAF", "ZA"),
    ("LSO", "LS"), ("SWZ", "SZ"), ("BWA", "BW"), ("NER", "NE"), ("MLI", "ML"), ("BFA", "BF"),
    ("MRT", "MR"), ("CPV", "CV"), ("SYC", "SC"), ("COM", "KM"), ("MUS", "MU"), ("MDG", "MG"),
    // Asia
    ("CHN", "CN"), ("JPN", "JP"), ("KOR", "KR"), ("PRK", "KP"), ("MNG", "MN"), ("TWN", "TW"),
    ("THA", "TH"), ("VNM", "VN"), ("LAO", "LA"), ("KHM", "KH"), ("IND", "IN"), ("PAK", "PK"),
    ("BGD", "BD"), ("LKA", "LK"), ("NPL", "NP"), ("BTN", "BT"), ("MMR", "MM"), ("MDV", "MV"),
    ("AFG", "AF"), ("IRN", "IR"), ("KAZ", "KZ"), ("UZB", "UZ"), ("TKM", "TM"), ("TJK", "TJ"),
    ("KGZ", "KG"), ("ARM", "AM"), ("AZE", "AZ"), ("GEO", "GE"), ("TUR", "TR"), ("SAU", "SA"),
    ("ARE", "AE"), ("QAT", "QA"), ("KWT", "KW"), ("OMN", "OM"), ("YEM", "YE"), ("IRQ", "IQ"),
    ("SYR", "SY"), ("JOR", "JO"), ("ISR", "IL"), ("IDN", "ID"), ("MYS", "MY"), ("SGP", "SG"),
    ("PHL", "PH"), ("BRN", "BN"), ("TLS", "TL"), ("BHR", "BH"), ("LBN", "LB"),
];

/// Alpha-2 spellings with no entry above (or that must win over it)
const ALPHA2_EXTRA: &[(&str, &str)] = &[("UK", "GBR")];

/// Administrative codes replaced by the code the rest of the app uses
const REMAPPED: &[(&str, &str)] = &[("KOS", "XKX")];

/// Canonical country identity.
///
/// Normally an ISO alpha-3 code. An alpha-2 value with no known alpha-3 form
/// passes through as a 2-character code so it still compares stably.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode {
    bytes: [u8; 3],
    len: u8,
}

impl CountryCode {
    /// Parse a 2-3 character alphanumeric code, upper-casing it.
    /// No alias lookup happens here; see [`IdentityResolver::resolve_code`].
    pub fn new(raw: &str) -> Option<Self> {
        if !is_plausible_code(raw) {
            return None;
        }
        let mut bytes = [0u8; 3];
        for (dst, src) in bytes.iter_mut().zip(raw.bytes()) {
            *dst = src.to_ascii_uppercase();
        }
        Some(Self {
            bytes,
            len: raw.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII alphanumerics are ever stored
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }

    pub fn is_alpha3(&self) -> bool {
        self.len == 3
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountryCode({})", self.as_str())
    }
}

/// Shape check applied to every candidate value: 2 or 3 ASCII alphanumerics,
/// not the no-data marker.
pub fn is_plausible_code(value: &str) -> bool {
    value != NO_DATA
        && (value.len() == 2 || value.len() == 3)
        && value.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Normalizes the identifiers found in boundary metadata into one canonical code.
///
/// Lookup tables are built once in [`IdentityResolver::new`] and never change afterwards.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    alpha2_to_alpha3: HashMap<CountryCode, CountryCode>,
    alpha3_to_alpha2: HashMap<CountryCode, CountryCode>,
    remapped: HashMap<CountryCode, CountryCode>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        let pairs = ALPHA3_TO_ALPHA2
            .iter()
            .filter_map(|&(a3, a2)| Some((CountryCode::new(a3)?, CountryCode::new(a2)?)));

        let mut alpha2_to_alpha3 = HashMap::new();
        let mut alpha3_to_alpha2 = HashMap::new();
        for (a3, a2) in pairs {
            alpha3_to_alpha2.insert(a3, a2);
            alpha2_to_alpha3.insert(a2, a3);
        }
        for &(a2, a3) in ALPHA2_EXTRA {
            if let (Some(a2), Some(a3)) = (CountryCode::new(a2), CountryCode::new(a3)) {
                alpha2_to_alpha3.insert(a2, a3);
            }
        }

        let remapped = REMAPPED
            .iter()
            .filter_map(|&(from, to)| Some((CountryCode::new(from)?, CountryCode::new(to)?)))
            .collect();

        Self {
            alpha2_to_alpha3,
            alpha3_to_alpha2,
            remapped,
        }
    }

    /// First structurally valid identifier in the property bag, canonicalized.
    /// Keys are probed in [`IDENTITY_KEYS`] order; non-string values are skipped.
    pub fn resolve(&self, properties: &PropertyBag) -> Option<CountryCode> {
        IDENTITY_KEYS
            .iter()
            .filter_map(|key| properties.get(*key).and_then(JsonValue::as_str))
            .map(str::trim)
            .find(|value| is_plausible_code(value))
            .and_then(|value| self.resolve_code(value))
    }

    /// Canonicalize a bare code, e.g. a click target or an answer key.
    /// Resolving an already canonical code returns it unchanged.
    pub fn resolve_code(&self, raw: &str) -> Option<CountryCode> {
        let code = CountryCode::new(raw.trim())?;
        let code = if code.is_alpha3() {
            code
        } else {
            self.alpha2_to_alpha3.get(&code).copied().unwrap_or(code)
        };
        Some(self.remapped.get(&code).copied().unwrap_or(code))
    }

    /// Alpha-2 form of a canonical code, if the country is known
    pub fn alpha2(&self, code: CountryCode) -> Option<CountryCode> {
        self.alpha3_to_alpha2.get(&code).copied()
    }

    /// Number of alpha-3 codes with a known alpha-2 form
    pub fn known_countries(&self) -> usize {
        self.alpha3_to_alpha2.len()
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-feature identity cache keyed by the feature's index in its collection.
///
/// Owned by the rendering layer; dropped wholesale via [`IdentityCache::invalidate`]
/// when the collection is replaced.
#[derive(Clone, Debug, Default)]
pub struct IdentityCache {
    resolved: HashMap<usize, Option<CountryCode>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_resolve(
        &mut self,
        key: usize,
        feature: &GeoFeature,
        resolver: &IdentityResolver,
    ) -> Option<CountryCode> {
        *self.resolved.entry(key).or_insert_with(|| {
            let code = resolver.resolve(&feature.properties);
            if code.is_none() {
                tracing::debug!(feature = key, "no usable country code in feature properties");
            }
            code
        })
    }

    /// Cached value without resolving; `None` when never resolved
    pub fn peek(&self, key: usize) -> Option<Option<CountryCode>> {
        self.resolved.get(&key).copied()
    }

    pub fn invalidate(&mut self) {
        self.resolved.clear();
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> PropertyBag {
        match value {
            serde_json::Value::Object(map) => map,
            _ => PropertyBag::new(),
        }
    }

    #[test]
    fn test_sentinel_is_skipped_and_lowercase_accepted() {
        let resolver = IdentityResolver::new();
        let bag = props(json!({ "iso_a3": "-99", "adm0_a3": "nld" }));
        assert_eq!(resolver.resolve(&bag).map(|c| c.to_string()), Some("NLD".to_string()));
    }

    #[test]
    fn test_key_priority() {
        let resolver = IdentityResolver::new();
        let bag = props(json!({ "iso_a2": "BE", "sov_a3": "FRA", "ISO_A3": "DEU" }));
        assert_eq!(resolver.resolve(&bag).unwrap().as_str(), "DEU");
    }

    #[test]
    fn test_alpha2_maps_to_alpha3() {
        let resolver = IdentityResolver::new();
        let bag = props(json!({ "iso_a2": "br" }));
        assert_eq!(resolver.resolve(&bag).unwrap().as_str(), "BRA");
        assert_eq!(resolver.resolve_code("UK").unwrap().as_str(), "GBR");
        assert_eq!(resolver.resolve_code("GB").unwrap().as_str(), "GBR");
    }

    #[test]
    fn test_unknown_alpha2_passes_through() {
        let resolver = IdentityResolver::new();
        let code = resolver.resolve_code("QZ").unwrap();
        assert_eq!(code.as_str(), "QZ");
        assert!(!code.is_alpha3());
    }

    #[test]
    fn test_kosovo_remap() {
        let resolver = IdentityResolver::new();
        let bag = props(json!({ "iso_a3": "-99", "adm0_a3": "KOS" }));
        assert_eq!(resolver.resolve(&bag).unwrap().as_str(), "XKX");
        assert_eq!(resolver.resolve_code("XK").unwrap().as_str(), "XKX");
    }

    #[test]
    fn test_idempotent() {
        let resolver = IdentityResolver::new();
        for raw in ["nld", "NL", "KOS", "XKX", "uk", "QZ", "usa"] {
            let once = resolver.resolve_code(raw).unwrap();
            let twice = resolver.resolve_code(once.as_str()).unwrap();
            assert_eq!(once, twice, "resolving {raw} twice changed it");
        }
    }

    #[test]
    fn test_rejects_implausible_values() {
        let resolver = IdentityResolver::new();
        let bag = props(json!({
            "iso_a3": "",
            "ISO_A3": "N-L",
            "adm0_a3": "NETH",
            "ADM0_A3": 528,
            "sov_a3": null,
            "iso_a2": "-99"
        }));
        assert_eq!(resolver.resolve(&bag), None);
        assert_eq!(resolver.resolve_code("-99"), None);
        assert_eq!(resolver.resolve_code("X"), None);
    }

    #[test]
    fn test_invalid_candidate_falls_through_to_next_key() {
        let resolver = IdentityResolver::new();
        let bag = props(json!({ "iso_a3": "??", "brk_a3": "SMR" }));
        assert_eq!(resolver.resolve(&bag).unwrap().as_str(), "SMR");
    }

    #[test]
    fn test_alpha2_lookup() {
        let resolver = IdentityResolver::new();
        let nld = resolver.resolve_code("NLD").unwrap();
        assert_eq!(resolver.alpha2(nld).unwrap().as_str(), "NL");
        assert!(resolver.known_countries() > 180);
    }

    #[test]
    fn test_cache_resolves_once_and_invalidates() {
        let resolver = IdentityResolver::new();
        let mut cache = IdentityCache::new();
        let feature = GeoFeature::new(None, props(json!({ "ISO3": "mco" })));

        assert_eq!(cache.peek(7), None);
        let code = cache.get_or_resolve(7, &feature, &resolver);
        assert_eq!(code.unwrap().as_str(), "MCO");
        assert_eq!(cache.peek(7), Some(code));

        let anonymous = GeoFeature::default();
        assert_eq!(cache.get_or_resolve(8, &anonymous, &resolver), None);
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
    }
}
