//! Encode/decode between local setting values and wire values
//!
//! Local values mirror the wire format except for two boundary rules:
//! - the security header policy is nested one level deeper on the wire,
//!   under `strict_transport_security`;
//! - `zero_rtt` is called `0rtt` on the wire.
//!
//! Accepted-value sets are enforced for user input (`parse_local`,
//! `validate`) only. Values read back from the remote or from stored
//! snapshots are checked for shape, never for membership.

use super::registry::{self, AllowedValues, ObjectKind, SettingDescriptor, Shape, POLISH, WEBP};
use crate::contract::{
    Minify, MobileRedirect, Setting, SettingValue, StrictTransportSecurity, ZoneSettings,
    ZoneSettingsError,
};
use serde_json::{Map, Value};

const HSTS_ENVELOPE: &str = "strict_transport_security";

// ===== Wire boundary =====

/// Decode a wire setting into its registry entry and local value
///
/// Unknown identifiers yield `UnknownSetting`; callers reading remote state
/// log and skip those.
pub fn decode(
    wire_id: &str,
    value: &Value,
) -> Result<(&'static SettingDescriptor, SettingValue), ZoneSettingsError> {
    let desc = registry::lookup_wire(wire_id).ok_or_else(|| ZoneSettingsError::unknown(wire_id))?;

    let local = match desc.shape {
        Shape::Object(ObjectKind::SecurityHeader) => {
            let inner = value
                .as_object()
                .and_then(|o| o.get(HSTS_ENVELOPE))
                .ok_or_else(|| {
                    ZoneSettingsError::encoding(desc.name, format!("missing '{}'", HSTS_ENVELOPE))
                })?;
            read_value(desc, inner)?
        }
        _ => read_value(desc, value)?,
    };

    Ok((desc, local))
}

/// Encode a local value into the setting sent to the remote
///
/// Fails with `UnknownSetting` for names outside the registry and with
/// `Encoding` when the value does not fit the declared shape.
pub fn encode(name: &str, value: &SettingValue) -> Result<Setting, ZoneSettingsError> {
    let desc = registry::descriptor(name)?;
    check_shape(desc, value)?;

    let local = local_json(value);
    let wire = match desc.shape {
        Shape::Object(ObjectKind::SecurityHeader) => {
            let mut envelope = Map::new();
            envelope.insert(HSTS_ENVELOPE.to_string(), local);
            Value::Object(envelope)
        }
        _ => local,
    };

    Ok(Setting::new(desc.wire_name, wire))
}

// ===== Local form =====

/// Parse user-supplied local JSON for one setting, enforcing accepted values
pub fn parse_local(name: &str, value: &Value) -> Result<SettingValue, ZoneSettingsError> {
    let desc = registry::descriptor(name)?;
    let parsed = read_value(desc, value)?;
    check_allowed(desc, &parsed)?;
    Ok(parsed)
}

/// Parse stored local JSON for one setting, checking shape only
pub fn restore_local(name: &str, value: &Value) -> Result<SettingValue, ZoneSettingsError> {
    let desc = registry::descriptor(name)?;
    read_value(desc, value)
}

/// Check a value against the setting's shape and accepted values
pub fn validate(name: &str, value: &SettingValue) -> Result<(), ZoneSettingsError> {
    let desc = registry::descriptor(name)?;
    check_shape(desc, value)?;
    check_allowed(desc, value)
}

/// Local JSON form of a value (nested objects unwrapped)
pub fn local_json(value: &SettingValue) -> Value {
    match value {
        SettingValue::Text(s) => Value::String(s.clone()),
        SettingValue::Integer(i) => Value::from(*i),
        SettingValue::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        SettingValue::Minify(m) => {
            let mut obj = Map::new();
            obj.insert("css".into(), Value::String(m.css.clone()));
            obj.insert("html".into(), Value::String(m.html.clone()));
            obj.insert("js".into(), Value::String(m.js.clone()));
            Value::Object(obj)
        }
        SettingValue::MobileRedirect(r) => {
            let mut obj = Map::new();
            obj.insert(
                "mobile_subdomain".into(),
                r.mobile_subdomain.clone().map_or(Value::Null, Value::String),
            );
            obj.insert("strip_uri".into(), Value::Bool(r.strip_uri));
            obj.insert("status".into(), Value::String(r.status.clone()));
            Value::Object(obj)
        }
        SettingValue::SecurityHeader(h) => {
            let mut obj = Map::new();
            let flags = [
                ("enabled", h.enabled),
                ("preload", h.preload),
                ("include_subdomains", h.include_subdomains),
                ("nosniff", h.nosniff),
            ];
            for (key, flag) in flags {
                if let Some(flag) = flag {
                    obj.insert(key.into(), Value::Bool(flag));
                }
            }
            if let Some(max_age) = h.max_age {
                obj.insert("max_age".into(), Value::from(max_age));
            }
            Value::Object(obj)
        }
    }
}

/// Parse a desired-settings document (`{name: local value, ...}`)
pub fn parse_desired(document: &Value) -> Result<ZoneSettings, ZoneSettingsError> {
    let Some(entries) = document.as_object() else {
        return Err(ZoneSettingsError::Encoding {
            name: "settings".to_string(),
            reason: "expected an object of setting names to values".to_string(),
        });
    };

    let mut desired = ZoneSettings::new();
    for (name, value) in entries {
        desired.insert(name.clone(), parse_local(name, value)?);
    }
    Ok(desired)
}

/// Local JSON document of a snapshot
pub fn snapshot_json(settings: &ZoneSettings) -> Map<String, Value> {
    settings
        .iter()
        .map(|(name, value)| (name.to_string(), local_json(value)))
        .collect()
}

/// Rebuild a stored snapshot document
pub fn restore_snapshot(document: &Map<String, Value>) -> Result<ZoneSettings, ZoneSettingsError> {
    let mut settings = ZoneSettings::new();
    for (name, value) in document {
        settings.insert(name.clone(), restore_local(name, value)?);
    }
    Ok(settings)
}

/// Complete a desired value with the sub-fields it leaves out
///
/// Security header fields are optional in desired state; an omitted field
/// keeps its current remote value so the object is still compared and
/// written as a whole.
pub fn fill_omitted(wanted: &SettingValue, current: Option<&SettingValue>) -> SettingValue {
    match (wanted, current) {
        (SettingValue::SecurityHeader(want), Some(SettingValue::SecurityHeader(have))) => {
            SettingValue::SecurityHeader(StrictTransportSecurity {
                enabled: want.enabled.or(have.enabled),
                preload: want.preload.or(have.preload),
                max_age: want.max_age.or(have.max_age),
                include_subdomains: want.include_subdomains.or(have.include_subdomains),
                nosniff: want.nosniff.or(have.nosniff),
            })
        }
        _ => wanted.clone(),
    }
}

// ===== Coupled settings =====

/// Whether `webp` may be written given the governing `polish` value
pub fn webp_allowed(polish: Option<&SettingValue>) -> bool {
    matches!(polish.and_then(SettingValue::as_text), Some(p) if !p.is_empty() && p != "off")
}

/// Replace the remote `webp` with the prior local one while `polish` is off
///
/// The remote value is meaningless without polish, so the previously stored
/// value is kept (or the entry dropped when there was none).
pub fn preserve_webp(observed: &mut ZoneSettings, prior: &ZoneSettings) {
    if webp_allowed(observed.get(POLISH)) {
        return;
    }
    match prior.get(WEBP) {
        Some(local) => {
            observed.insert(WEBP, local.clone());
        }
        None => {
            observed.remove(WEBP);
        }
    }
}

// ===== Shape handling =====

fn read_value(desc: &SettingDescriptor, value: &Value) -> Result<SettingValue, ZoneSettingsError> {
    let name = desc.name;
    match desc.shape {
        Shape::Enum(_) | Shape::Text => value
            .as_str()
            .map(SettingValue::text)
            .ok_or_else(|| type_error(name, "a string", value)),
        Shape::Integer(_) => read_integer(value)
            .map(SettingValue::Integer)
            .ok_or_else(|| type_error(name, "an integer", value)),
        Shape::StringList => {
            let items = value
                .as_array()
                .ok_or_else(|| type_error(name, "a list of strings", value))?;
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| type_error(name, "a list of strings", value))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SettingValue::List)
        }
        Shape::Object(kind) => {
            let obj = value
                .as_object()
                .ok_or_else(|| type_error(name, "an object", value))?;
            read_object(name, kind, obj)
        }
    }
}

fn read_object(
    name: &str,
    kind: ObjectKind,
    obj: &Map<String, Value>,
) -> Result<SettingValue, ZoneSettingsError> {
    let fields = ObjectFields { name, obj };
    match kind {
        ObjectKind::Minify => Ok(SettingValue::Minify(Minify {
            css: fields.string("css")?,
            html: fields.string("html")?,
            js: fields.string("js")?,
        })),
        ObjectKind::MobileRedirect => Ok(SettingValue::MobileRedirect(MobileRedirect {
            mobile_subdomain: fields.optional_string("mobile_subdomain")?,
            strip_uri: fields.bool("strip_uri")?,
            status: fields.string("status")?,
        })),
        ObjectKind::SecurityHeader => Ok(SettingValue::SecurityHeader(StrictTransportSecurity {
            enabled: fields.optional_bool("enabled")?,
            preload: fields.optional_bool("preload")?,
            max_age: fields.optional_integer("max_age")?,
            include_subdomains: fields.optional_bool("include_subdomains")?,
            nosniff: fields.optional_bool("nosniff")?,
        })),
    }
}

/// Typed field access with errors naming `setting.field`
struct ObjectFields<'a> {
    name: &'a str,
    obj: &'a Map<String, Value>,
}

impl ObjectFields<'_> {
    fn present(&self, key: &str) -> Option<&Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn missing(&self, key: &str) -> ZoneSettingsError {
        ZoneSettingsError::encoding(self.name, format!("missing field '{}'", key))
    }

    fn wrong(&self, key: &str, expected: &str) -> ZoneSettingsError {
        ZoneSettingsError::encoding(self.name, format!("field '{}' must be {}", key, expected))
    }

    fn string(&self, key: &str) -> Result<String, ZoneSettingsError> {
        self.optional_string(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_string(&self, key: &str) -> Result<Option<String>, ZoneSettingsError> {
        self.present(key)
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| self.wrong(key, "a string")))
            .transpose()
    }

    fn bool(&self, key: &str) -> Result<bool, ZoneSettingsError> {
        self.optional_bool(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>, ZoneSettingsError> {
        self.present(key)
            .map(|v| v.as_bool().ok_or_else(|| self.wrong(key, "a boolean")))
            .transpose()
    }

    fn optional_integer(&self, key: &str) -> Result<Option<i64>, ZoneSettingsError> {
        self.present(key)
            .map(|v| read_integer(v).ok_or_else(|| self.wrong(key, "an integer")))
            .transpose()
    }
}

/// Integers sometimes arrive as floats (`14400.0`)
fn read_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn type_error(name: &str, expected: &str, got: &Value) -> ZoneSettingsError {
    ZoneSettingsError::encoding(name, format!("expected {}, got {}", expected, got))
}

fn check_shape(desc: &SettingDescriptor, value: &SettingValue) -> Result<(), ZoneSettingsError> {
    let fits = matches!(
        (desc.shape, value),
        (Shape::Enum(_) | Shape::Text, SettingValue::Text(_))
            | (Shape::Integer(_), SettingValue::Integer(_))
            | (Shape::StringList, SettingValue::List(_))
            | (Shape::Object(ObjectKind::Minify), SettingValue::Minify(_))
            | (
                Shape::Object(ObjectKind::MobileRedirect),
                SettingValue::MobileRedirect(_)
            )
            | (
                Shape::Object(ObjectKind::SecurityHeader),
                SettingValue::SecurityHeader(_)
            )
    );
    if fits {
        Ok(())
    } else {
        Err(ZoneSettingsError::encoding(
            desc.name,
            format!("{} does not fit shape {:?}", value.kind(), desc.shape),
        ))
    }
}

fn check_allowed(desc: &SettingDescriptor, value: &SettingValue) -> Result<(), ZoneSettingsError> {
    let accepted = match (desc.allowed_values(), value) {
        (Some(AllowedValues::Strings(set)), SettingValue::Text(s)) => set.contains(&s.as_str()),
        (Some(AllowedValues::Integers(set)), SettingValue::Integer(i)) => set.contains(i),
        _ => true,
    };
    if !accepted {
        return Err(ZoneSettingsError::encoding(
            desc.name,
            format!("{} is not one of the accepted values", local_json(value)),
        ));
    }

    match value {
        SettingValue::Minify(m) => {
            for (field, toggle) in [("css", &m.css), ("html", &m.html), ("js", &m.js)] {
                check_on_off(desc.name, field, toggle)?;
            }
        }
        SettingValue::MobileRedirect(r) => {
            if r.mobile_subdomain.is_none() {
                return Err(ZoneSettingsError::encoding(
                    desc.name,
                    "missing field 'mobile_subdomain'",
                ));
            }
            check_on_off(desc.name, "status", &r.status)?
        }
        _ => {}
    }
    Ok(())
}

fn check_on_off(name: &str, field: &str, value: &str) -> Result<(), ZoneSettingsError> {
    if value == "on" || value == "off" {
        Ok(())
    } else {
        Err(ZoneSettingsError::encoding(
            name,
            format!("field '{}' must be \"on\" or \"off\", got \"{}\"", field, value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_security_header_is_unwrapped_on_decode() {
        let wire = json!({
            "strict_transport_security": {
                "enabled": true,
                "max_age": 86400,
                "include_subdomains": true,
                "preload": false,
                "nosniff": true
            }
        });

        let (desc, value) = decode("security_header", &wire).unwrap();
        assert_eq!(desc.name, "security_header");
        assert_eq!(
            value,
            SettingValue::SecurityHeader(StrictTransportSecurity {
                enabled: Some(true),
                preload: Some(false),
                max_age: Some(86400),
                include_subdomains: Some(true),
                nosniff: Some(true),
            })
        );

        let encoded = encode("security_header", &value).unwrap();
        assert_eq!(encoded.id, "security_header");
        assert_eq!(encoded.value, wire);
    }

    #[test]
    fn test_zero_rtt_renamed_both_ways() {
        let (desc, value) = decode("0rtt", &json!("on")).unwrap();
        assert_eq!(desc.name, "zero_rtt");

        let encoded = encode("zero_rtt", &value).unwrap();
        assert_eq!(encoded.id, "0rtt");
        assert!(matches!(
            encode("0rtt", &value),
            Err(ZoneSettingsError::UnknownSetting { .. })
        ));
    }

    #[test]
    fn test_unknown_wire_setting() {
        let err = decode("brand_new_feature", &json!("on")).unwrap_err();
        assert_eq!(
            err,
            ZoneSettingsError::UnknownSetting {
                name: "brand_new_feature".to_string()
            }
        );
    }

    #[test]
    fn test_integer_accepts_integral_floats() {
        let (_, value) = decode("browser_cache_ttl", &json!(14400.0)).unwrap();
        assert_eq!(value, SettingValue::Integer(14400));
        assert!(decode("browser_cache_ttl", &json!(1.5)).is_err());
        assert!(decode("browser_cache_ttl", &json!("14400")).is_err());
    }

    #[test]
    fn test_mobile_redirect_null_subdomain() {
        let wire = json!({"mobile_subdomain": null, "strip_uri": false, "status": "off"});
        let (_, value) = decode("mobile_redirect", &wire).unwrap();
        assert_eq!(
            value,
            SettingValue::MobileRedirect(MobileRedirect {
                mobile_subdomain: None,
                strip_uri: false,
                status: "off".to_string(),
            })
        );
        assert_eq!(local_json(&value), wire);
    }

    #[test]
    fn test_encode_rejects_shape_mismatch() {
        let err = encode("cache_level", &SettingValue::Integer(3)).unwrap_err();
        assert!(matches!(err, ZoneSettingsError::Encoding { name, .. } if name == "cache_level"));
    }

    #[test]
    fn test_parse_local_enforces_accepted_values() {
        assert!(parse_local("cache_level", &json!("aggressive")).is_ok());
        assert!(parse_local("cache_level", &json!("extreme")).is_err());
        assert!(parse_local("browser_cache_ttl", &json!(42)).is_err());
        assert!(parse_local("minify", &json!({"css": "on", "html": "maybe", "js": "off"})).is_err());
        assert!(parse_local("minify", &json!({"css": "on", "html": "on"})).is_err());
    }

    #[test]
    fn test_mobile_redirect_requires_subdomain_from_users() {
        let wire = json!({"mobile_subdomain": null, "strip_uri": false, "status": "off"});
        let err = parse_local("mobile_redirect", &wire).unwrap_err();
        assert!(err.to_string().contains("mobile_subdomain"));
        assert!(restore_local("mobile_redirect", &wire).is_ok());

        let complete = json!({"mobile_subdomain": "m", "strip_uri": true, "status": "on"});
        assert!(parse_local("mobile_redirect", &complete).is_ok());
    }

    #[test]
    fn test_restore_local_skips_membership_check() {
        // Remote-reported values outside the declared set must still load
        assert_eq!(
            restore_local("cache_level", &json!("experimental")).unwrap(),
            SettingValue::text("experimental")
        );
    }

    #[test]
    fn test_parse_desired_document() {
        let desired = parse_desired(&json!({
            "cache_level": "aggressive",
            "minify": {"css": "on", "html": "on", "js": "off"},
            "ciphers": ["ECDHE-RSA-AES128-GCM-SHA256"]
        }))
        .unwrap();

        assert_eq!(desired.len(), 3);
        assert_eq!(desired.get("cache_level"), Some(&SettingValue::text("aggressive")));

        let err = parse_desired(&json!({"cache_levle": "basic"})).unwrap_err();
        assert!(matches!(err, ZoneSettingsError::UnknownSetting { name } if name == "cache_levle"));
    }

    #[test]
    fn test_round_trip_for_every_registered_name() {
        for desc in registry::all() {
            let sample = sample_value(desc.shape);
            let encoded = encode(desc.name, &sample).unwrap();
            let (decoded_desc, decoded) = decode(&encoded.id, &encoded.value).unwrap();
            assert_eq!(decoded_desc.name, desc.name);
            assert_eq!(decoded, sample, "round trip failed for {}", desc.name);
        }
    }

    #[test]
    fn test_webp_gate() {
        assert!(!webp_allowed(None));
        assert!(!webp_allowed(Some(&SettingValue::text(""))));
        assert!(!webp_allowed(Some(&SettingValue::text("off"))));
        assert!(webp_allowed(Some(&SettingValue::text("lossless"))));
    }

    #[test]
    fn test_preserve_webp_keeps_prior_value_while_polish_off() {
        let prior = ZoneSettings::new().with("webp", SettingValue::text("on"));

        let mut observed = ZoneSettings::new()
            .with("polish", SettingValue::text("off"))
            .with("webp", SettingValue::text("off"));
        preserve_webp(&mut observed, &prior);
        assert_eq!(observed.get("webp"), Some(&SettingValue::text("on")));

        let mut without_prior = ZoneSettings::new().with("webp", SettingValue::text("off"));
        preserve_webp(&mut without_prior, &ZoneSettings::new());
        assert!(without_prior.get("webp").is_none());

        let mut polished = ZoneSettings::new()
            .with("polish", SettingValue::text("lossy"))
            .with("webp", SettingValue::text("off"));
        preserve_webp(&mut polished, &prior);
        assert_eq!(polished.get("webp"), Some(&SettingValue::text("off")));
    }

    fn sample_value(shape: Shape) -> SettingValue {
        match shape {
            Shape::Enum(values) => SettingValue::text(values[values.len() - 1]),
            Shape::Text => SettingValue::text("120"),
            Shape::Integer(Some(values)) => SettingValue::Integer(values[1]),
            Shape::Integer(None) => SettingValue::Integer(200),
            Shape::StringList => SettingValue::List(vec![
                "ECDHE-ECDSA-AES128-GCM-SHA256".to_string(),
                "AES128-SHA".to_string(),
            ]),
            Shape::Object(ObjectKind::Minify) => SettingValue::Minify(Minify {
                css: "on".to_string(),
                html: "off".to_string(),
                js: "on".to_string(),
            }),
            Shape::Object(ObjectKind::MobileRedirect) => {
                SettingValue::MobileRedirect(MobileRedirect {
                    mobile_subdomain: Some("m".to_string()),
                    strip_uri: true,
                    status: "on".to_string(),
                })
            }
            Shape::Object(ObjectKind::SecurityHeader) => {
                SettingValue::SecurityHeader(StrictTransportSecurity {
                    enabled: Some(true),
                    preload: None,
                    max_age: Some(31536000),
                    include_subdomains: Some(false),
                    nosniff: None,
                })
            }
        }
    }
}
