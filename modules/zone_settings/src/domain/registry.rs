//! Static registry of known zone settings
//!
//! Every setting the engine may read or write has exactly one entry here,
//! carrying its value shape, the endpoint family it lives behind and its
//! accepted values. Declaration order is the write order.

use crate::contract::ZoneSettingsError;

/// Value shape of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// String from a closed set
    Enum(&'static [&'static str]),
    /// Integer, optionally from a closed set
    Integer(Option<&'static [i64]>),
    /// Free-form string
    Text,
    /// List of strings
    StringList,
    /// Object with a fixed sub-field schema, replaced as a whole
    Object(ObjectKind),
}

/// Fixed-schema nested objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Minify,
    MobileRedirect,
    /// Wrapped under `strict_transport_security` on the wire
    SecurityHeader,
}

/// Endpoint family a setting is read and written through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Batch settings endpoint
    Bulk,
    /// Dedicated per-setting endpoint only
    Single,
    /// Separate on/off feature-status endpoint
    Toggle,
}

/// Closed set of accepted values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedValues {
    Strings(&'static [&'static str]),
    Integers(&'static [i64]),
}

/// Registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescriptor {
    /// Local name used in snapshots and desired configuration
    pub name: &'static str,
    /// Identifier used by the remote API
    pub wire_name: &'static str,
    pub shape: Shape,
    pub route: Route,
    /// Replacement hint for deprecated settings
    pub deprecation: Option<&'static str>,
}

impl SettingDescriptor {
    const fn bulk(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            wire_name: name,
            shape,
            route: Route::Bulk,
            deprecation: None,
        }
    }

    const fn single(self) -> Self {
        Self {
            route: Route::Single,
            ..self
        }
    }

    const fn toggle(self) -> Self {
        Self {
            route: Route::Toggle,
            ..self
        }
    }

    const fn wire(self, wire_name: &'static str) -> Self {
        Self { wire_name, ..self }
    }

    const fn deprecated(self, hint: &'static str) -> Self {
        Self {
            deprecation: Some(hint),
            ..self
        }
    }

    /// Closed set of accepted values, if the shape has one
    pub fn allowed_values(&self) -> Option<AllowedValues> {
        match self.shape {
            Shape::Enum(values) => Some(AllowedValues::Strings(values)),
            Shape::Integer(Some(values)) => Some(AllowedValues::Integers(values)),
            Shape::Integer(None) | Shape::Text | Shape::StringList | Shape::Object(_) => None,
        }
    }
}

/// Setting whose writes depend on `POLISH`
pub const WEBP: &str = "webp";
/// Image optimisation mode gating `WEBP`
pub const POLISH: &str = "polish";

const ON_OFF: &[&str] = &["on", "off"];

const BROWSER_CACHE_TTLS: &[i64] = &[
    0, 30, 60, 300, 1200, 1800, 3600, 7200, 10800, 14400, 18000, 28800, 43200, 57600, 72000,
    86400, 172800, 259200, 345600, 432000, 691200, 1382400, 2073600, 2678400, 5356800, 16070400,
    31536000,
];

const CHALLENGE_TTLS: &[i64] = &[
    300, 900, 1800, 2700, 3600, 7200, 10800, 14400, 28800, 57600, 86400, 604800, 2592000, 31536000,
];

use SettingDescriptor as D;

const fn on_off(name: &'static str) -> SettingDescriptor {
    D::bulk(name, Shape::Enum(ON_OFF))
}

const fn one_of(name: &'static str, values: &'static [&'static str]) -> SettingDescriptor {
    D::bulk(name, Shape::Enum(values))
}

static SETTINGS: &[SettingDescriptor] = &[
    on_off("always_online"),
    on_off("brotli"),
    D::bulk("browser_cache_ttl", Shape::Integer(Some(BROWSER_CACHE_TTLS))),
    on_off("browser_check"),
    one_of("cache_level", &["aggressive", "basic", "simplified"]),
    D::bulk("ciphers", Shape::StringList),
    D::bulk("challenge_ttl", Shape::Integer(Some(CHALLENGE_TTLS))),
    on_off("development_mode"),
    on_off("origin_error_page_pass_thru"),
    on_off("sort_query_string_for_cache"),
    on_off("email_obfuscation"),
    on_off("hotlink_protection"),
    on_off("ip_geolocation"),
    on_off("ipv6"),
    on_off("websockets"),
    D::bulk("minify", Shape::Object(ObjectKind::Minify)),
    D::bulk("mobile_redirect", Shape::Object(ObjectKind::MobileRedirect)),
    on_off("mirage"),
    on_off("opportunistic_encryption"),
    on_off("opportunistic_onion"),
    one_of(POLISH, &["off", "lossless", "lossy"]),
    on_off(WEBP),
    on_off("prefetch_preload"),
    on_off("privacy_pass"),
    on_off("response_buffering"),
    one_of("rocket_loader", &["on", "off", "manual"]),
    D::bulk("security_header", Shape::Object(ObjectKind::SecurityHeader)),
    one_of(
        "security_level",
        &["off", "essentially_off", "low", "medium", "high", "under_attack"],
    ),
    on_off("server_side_exclude"),
    one_of("ssl", &["off", "flexible", "full", "strict", "origin_pull"]),
    on_off("universal_ssl").toggle(),
    on_off("tls_client_auth"),
    on_off("true_client_ip_header"),
    on_off("waf"),
    one_of("min_tls_version", &["1.0", "1.1", "1.2", "1.3"]),
    on_off("tls_1_2_only").deprecated("use min_tls_version = \"1.2\" instead"),
    one_of("tls_1_3", &["on", "off", "zrt"]),
    on_off("automatic_https_rewrites"),
    on_off("http2"),
    on_off("http3"),
    one_of("pseudo_ipv4", &["off", "add_header", "overwrite_header"]),
    D::bulk("always_use_https", Shape::Text),
    one_of(
        "cname_flattening",
        &["flatten_at_root", "flatten_all", "flatten_none"],
    ),
    D::bulk("max_upload", Shape::Integer(None)),
    one_of("h2_prioritization", &["on", "off", "custom"]).single(),
    one_of("image_resizing", &["on", "off", "open"]).single(),
    // "0rtt" is not a valid identifier in declarative configuration
    on_off("zero_rtt").wire("0rtt"),
    on_off("orange_to_orange"),
    on_off("filter_logs_to_cloudflare"),
    on_off("log_to_cloudflare"),
    on_off("visitor_ip"),
    D::bulk("proxy_read_timeout", Shape::Text),
    on_off("binary_ast").single(),
    on_off("early_hints").single(),
];

/// All registry entries in declaration order
pub fn all() -> impl Iterator<Item = &'static SettingDescriptor> {
    SETTINGS.iter()
}

/// Entries behind one endpoint family, in declaration order
pub fn with_route(route: Route) -> impl Iterator<Item = &'static SettingDescriptor> {
    SETTINGS.iter().filter(move |d| d.route == route)
}

/// Look up an entry by local name
pub fn lookup(name: &str) -> Option<&'static SettingDescriptor> {
    SETTINGS.iter().find(|d| d.name == name)
}

/// Look up an entry by remote identifier
pub fn lookup_wire(wire_name: &str) -> Option<&'static SettingDescriptor> {
    SETTINGS.iter().find(|d| d.wire_name == wire_name)
}

/// Look up an entry, failing for names outside the registry
pub fn descriptor(name: &str) -> Result<&'static SettingDescriptor, ZoneSettingsError> {
    lookup(name).ok_or_else(|| ZoneSettingsError::unknown(name))
}

/// Value shape of a setting
pub fn shape_of(name: &str) -> Result<Shape, ZoneSettingsError> {
    descriptor(name).map(|d| d.shape)
}

/// Closed set of accepted values; `None` for open shapes and unknown names
pub fn allowed_values(name: &str) -> Option<AllowedValues> {
    lookup(name).and_then(SettingDescriptor::allowed_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_wire_names_are_unique() {
        let names: HashSet<_> = all().map(|d| d.name).collect();
        let wire: HashSet<_> = all().map(|d| d.wire_name).collect();
        assert_eq!(names.len(), SETTINGS.len());
        assert_eq!(wire.len(), SETTINGS.len());
    }

    #[test]
    fn test_zero_rtt_is_renamed_on_the_wire() {
        let desc = lookup("zero_rtt").unwrap();
        assert_eq!(desc.wire_name, "0rtt");
        assert_eq!(lookup_wire("0rtt").unwrap().name, "zero_rtt");
        assert!(lookup("0rtt").is_none());
    }

    #[test]
    fn test_routes() {
        let single: Vec<_> = with_route(Route::Single).map(|d| d.name).collect();
        assert_eq!(
            single,
            vec!["h2_prioritization", "image_resizing", "binary_ast", "early_hints"]
        );

        let toggle: Vec<_> = with_route(Route::Toggle).map(|d| d.name).collect();
        assert_eq!(toggle, vec!["universal_ssl"]);
    }

    #[test]
    fn test_shape_lookup() {
        assert_eq!(
            shape_of("minify").unwrap(),
            Shape::Object(ObjectKind::Minify)
        );
        assert_eq!(shape_of("max_upload").unwrap(), Shape::Integer(None));
        assert!(matches!(
            shape_of("not_a_setting"),
            Err(ZoneSettingsError::UnknownSetting { name }) if name == "not_a_setting"
        ));
    }

    #[test]
    fn test_allowed_values() {
        match allowed_values("browser_cache_ttl") {
            Some(AllowedValues::Integers(values)) => {
                assert!(values.contains(&0));
                assert!(values.contains(&31536000));
                assert!(!values.contains(&42));
            }
            other => panic!("Expected integer set, got {:?}", other),
        }
        assert_eq!(
            allowed_values("polish"),
            Some(AllowedValues::Strings(&["off", "lossless", "lossy"]))
        );
        assert_eq!(allowed_values("ciphers"), None);
        assert_eq!(allowed_values("unknown"), None);
    }

    #[test]
    fn test_deprecated_setting_carries_hint() {
        let desc = lookup("tls_1_2_only").unwrap();
        assert!(desc.deprecation.unwrap().contains("min_tls_version"));
        assert!(lookup("min_tls_version").unwrap().deprecation.is_none());
    }
}
