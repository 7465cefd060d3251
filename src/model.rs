use std::collections::BTreeMap;
use std::fmt;

/// Language code carried by every nameable row's display name.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The closed set of catalog tables.
///
/// Declaration order is ranking priority: when two results tie, the
/// row from the earlier table wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Species,
    Form,
    Move,
    Item,
    Ability,
    Type,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Species,
        TableKind::Form,
        TableKind::Move,
        TableKind::Item,
        TableKind::Ability,
        TableKind::Type,
    ];

    /// Canonical table name, as stored in the catalog.
    pub fn tag(self) -> &'static str {
        match self {
            TableKind::Species => "pokemon_species",
            TableKind::Form => "pokemon_forms",
            TableKind::Move => "moves",
            TableKind::Item => "items",
            TableKind::Ability => "abilities",
            TableKind::Type => "types",
        }
    }

    /// Accepts canonical table names plus the short aliases users type
    /// in query qualifiers. Case-insensitive.
    pub fn parse(token: &str) -> Option<TableKind> {
        match token.to_ascii_lowercase().as_str() {
            "pokemon" | "species" | "pokemon_species" => Some(TableKind::Species),
            "form" | "forms" | "pokemon_forms" => Some(TableKind::Form),
            "move" | "moves" => Some(TableKind::Move),
            "item" | "items" => Some(TableKind::Item),
            "ability" | "abilities" => Some(TableKind::Ability),
            "type" | "types" => Some(TableKind::Type),
            _ => None,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One record in one catalog table, with its names keyed by language
/// code. Ids are unique within a table, not across tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub table: TableKind,
    pub id: u32,
    pub names: BTreeMap<String, String>,
}

impl Row {
    /// Default-language display name. Every nameable row carries one;
    /// the fallback to any other language keeps partial rows printable.
    pub fn name(&self) -> &str {
        self.names
            .get(DEFAULT_LANGUAGE)
            .or_else(|| self.names.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Points at one name entry inside the candidate index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    pub table: TableKind,
    pub id: u32,
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_parse_to_tables() {
        assert_eq!(TableKind::parse("pokemon"), Some(TableKind::Species));
        assert_eq!(TableKind::parse("POKEMON_SPECIES"), Some(TableKind::Species));
        assert_eq!(TableKind::parse("move"), Some(TableKind::Move));
        assert_eq!(TableKind::parse("items"), Some(TableKind::Item));
        assert_eq!(TableKind::parse("bogus"), None);
    }

    #[test]
    fn priority_follows_declaration_order() {
        assert!(TableKind::Species < TableKind::Move);
        assert!(TableKind::Move < TableKind::Type);
    }

    #[test]
    fn default_name_prefers_english() {
        let row = Row {
            table: TableKind::Species,
            id: 133,
            names: BTreeMap::from([
                ("en".to_string(), "Eevee".to_string()),
                ("fr".to_string(), "Evoli".to_string()),
            ]),
        };
        assert_eq!(row.name(), "Eevee");
    }
}
