use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::warn;

use crate::error::MembershipError;

/// One descriptor line of a rack. The last whitespace-separated token is
/// the peer address; anything before it is kept as `token`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    pub address: String,
    pub token: Option<String>,
}

impl MembershipEntry {
    /// `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields: Vec<&str> = line.split_whitespace().collect();
        let address = fields.pop()?.to_string();
        let token = (!fields.is_empty()).then(|| fields.join(" "));
        Some(Self { address, token })
    }
}

/// Datacenter -> rack -> ordered peer lines.
///
/// ```yaml
/// us-east-1:
///   rac1:
///     - "101134286 10.0.0.1"
///     - "1383429731 10.0.0.2"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipDocument {
    datacenters: HashMap<String, HashMap<String, Vec<MembershipEntry>>>,
}

impl MembershipDocument {
    /// Only unreadable YAML or a non-mapping root fails the whole document.
    /// A badly shaped datacenter, rack or line is logged and skipped so it
    /// cannot blank out the other racks.
    pub fn parse(document: &str) -> Result<Self, MembershipError> {
        if document.trim().is_empty() {
            return Ok(Self::default());
        }
        let root: Value = serde_yaml::from_str(document)
            .map_err(|err| MembershipError::Malformed(err.to_string()))?;

        let mut datacenters = HashMap::new();
        for (dc, racks) in as_mapping(&root, "document")? {
            let Some(dc) = scalar_key(dc) else {
                warn!(key = ?dc, "skipping datacenter with unsupported key");
                continue;
            };
            let racks = match as_mapping(racks, &dc) {
                Ok(racks) => racks,
                Err(err) => {
                    warn!(datacenter = %dc, error = %err, "skipping datacenter");
                    continue;
                }
            };

            let mut parsed = HashMap::new();
            for (rack, lines) in racks {
                let Some(rack) = scalar_key(rack) else {
                    warn!(datacenter = %dc, key = ?rack, "skipping rack with unsupported key");
                    continue;
                };
                match rack_entries(lines, &dc, &rack) {
                    Ok(entries) => {
                        parsed.insert(rack, entries);
                    }
                    Err(err) => {
                        warn!(datacenter = %dc, rack = %rack, error = %err, "skipping rack")
                    }
                }
            }
            datacenters.insert(dc, parsed);
        }
        Ok(Self { datacenters })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MembershipError> {
        let path = path.as_ref();
        let document = fs::read_to_string(path).map_err(|source| MembershipError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&document)
    }

    /// Entries of one rack; empty when the datacenter or rack is absent.
    pub fn entries(&self, datacenter: &str, rack: &str) -> &[MembershipEntry] {
        self.datacenters
            .get(datacenter)
            .and_then(|racks| racks.get(rack))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Peer addresses of one rack, in document order.
    pub fn peers(&self, datacenter: &str, rack: &str) -> Vec<String> {
        self.entries(datacenter, rack)
            .iter()
            .map(|entry| entry.address.clone())
            .collect()
    }

    pub fn datacenters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.datacenters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn racks(&self, datacenter: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .datacenters
            .get(datacenter)
            .map(|racks| racks.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

fn as_mapping<'a>(
    value: &'a Value,
    what: &str,
) -> Result<Vec<(&'a Value, &'a Value)>, MembershipError> {
    match value {
        Value::Mapping(map) => Ok(map.iter().collect()),
        Value::Null => Ok(Vec::new()),
        _ => Err(MembershipError::Malformed(format!("{what} must be a mapping"))),
    }
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn rack_entries(
    lines: &Value,
    dc: &str,
    rack: &str,
) -> Result<Vec<MembershipEntry>, MembershipError> {
    let lines = match lines {
        Value::Sequence(lines) => lines,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(MembershipError::Malformed(format!(
                "{dc}/{rack} must be a sequence of lines"
            )))
        }
    };

    let mut entries = Vec::with_capacity(lines.len());
    for line in lines {
        let line = match line {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                warn!(datacenter = dc, rack, line = ?other, "skipping non-text membership line");
                continue;
            }
        };
        match MembershipEntry::parse(&line) {
            Some(entry) => entries.push(entry),
            None => warn!(datacenter = dc, rack, "skipping blank membership line"),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_parse() {
        let entry = MembershipEntry::parse("10 1.2.3.4").unwrap();
        assert_eq!(entry.address, "1.2.3.4");
        assert_eq!(entry.token.as_deref(), Some("10"));

        let entry = MembershipEntry::parse("  10.0.0.7 ").unwrap();
        assert_eq!(entry.address, "10.0.0.7");
        assert_eq!(entry.token, None);

        assert_eq!(MembershipEntry::parse("   "), None);
    }

    #[test]
    fn test_empty_document() {
        let doc = MembershipDocument::parse("").unwrap();
        assert!(doc.datacenters().is_empty());
        assert!(doc.peers("dc1", "rac1").is_empty());
    }

    #[test]
    fn test_rejects_non_mapping_root() {
        assert!(matches!(
            MembershipDocument::parse("- a\n- b\n"),
            Err(MembershipError::Malformed(_))
        ));
        assert!(matches!(
            MembershipDocument::parse("dc1: [unbalanced\n"),
            Err(MembershipError::Malformed(_))
        ));
    }

    #[test]
    fn test_bad_rack_does_not_hide_others() {
        let doc = MembershipDocument::parse(
            "dc1:\n  rac1: [\"10 1.2.3.4\", \"20 1.2.3.5\"]\ndc2:\n  rac9: 10.9.9.9\n",
        )
        .unwrap();
        assert_eq!(doc.peers("dc1", "rac1"), vec!["1.2.3.4", "1.2.3.5"]);
        assert!(doc.peers("dc2", "rac9").is_empty());
        assert!(doc.racks("dc2").is_empty());
    }

    #[test]
    fn test_bad_datacenter_and_line_are_skipped() {
        let document = concat!(
            "dc1:\n",
            "  rac1:\n",
            "    - \"10 1.2.3.4\"\n",
            "    - {nested: true}\n",
            "    - \"20 1.2.3.5\"\n",
            "dc2: 42\n",
        );
        let doc = MembershipDocument::parse(document).unwrap();
        assert_eq!(doc.peers("dc1", "rac1"), vec!["1.2.3.4", "1.2.3.5"]);
        assert_eq!(doc.datacenters(), vec!["dc1"]);
    }

    #[test]
    fn test_null_rack_is_empty() {
        let doc = MembershipDocument::parse("dc1:\n  rac1:\n  rac2: [\"10.0.0.2\"]\n").unwrap();
        assert!(doc.peers("dc1", "rac1").is_empty());
        assert_eq!(doc.peers("dc1", "rac2"), vec!["10.0.0.2"]);
        assert_eq!(doc.racks("dc1"), vec!["rac1", "rac2"]);
    }
}
