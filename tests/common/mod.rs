//! Shared fixture: a small multilingual catalog with the collisions,
//! symbol names and transliterations the engine has to cope with,
//! plus a temp-dir search artifact built from it.

use std::path::Path;

use anyhow::Result;

use dex_search::lookup::LookupEngine;
use dex_search::model::{Row, TableKind};
use dex_search::search::tantivy::NameIndexWriter;

pub fn row(table: TableKind, id: u32, names: &[(&str, &str)]) -> Row {
    Row {
        table,
        id,
        names: names
            .iter()
            .map(|(language, name)| (language.to_string(), name.to_string()))
            .collect(),
    }
}

pub fn fixture_rows() -> Vec<Row> {
    use TableKind::*;
    vec![
        row(
            Species,
            1,
            &[
                ("en", "Bulbasaur"),
                ("fr", "Bulbizarre"),
                ("ja", "フシギダネ"),
                ("roomaji", "Fushigidane"),
            ],
        ),
        row(Species, 4, &[("en", "Charmander"), ("roomaji", "Hitokage")]),
        row(Species, 5, &[("en", "Charmeleon")]),
        row(Species, 6, &[("en", "Charizard")]),
        row(Species, 25, &[("en", "Pikachu"), ("ja", "ピカチュウ")]),
        row(Species, 29, &[("en", "Nidoran♀")]),
        row(Species, 32, &[("en", "Nidoran♂")]),
        row(Species, 83, &[("en", "Farfetch’d")]),
        row(Species, 122, &[("en", "Mr. Mime")]),
        row(
            Species,
            133,
            &[
                ("en", "Eevee"),
                ("fr", "Evoli"),
                ("de", "Evoli"),
                ("ja", "イーブイ"),
                ("roomaji", "Iibui"),
                ("ko", "이브이"),
                ("zh", "伊布"),
            ],
        ),
        row(Species, 198, &[("en", "Murkrow"), ("roomaji", "Yamikarasu")]),
        row(Species, 352, &[("en", "Kecleon"), ("ja", "カクレオン")]),
        row(Species, 474, &[("en", "Porygon-Z")]),
        row(Species, 501, &[("en", "Oshawott"), ("ko", "수댕이")]),
        row(Species, 613, &[("en", "Cubchoo"), ("zh", "噴嚏熊")]),
        row(Species, 775, &[("en", "Komala"), ("fr", "Dodoala")]),
        row(Form, 10059, &[("en", "Wash Rotom")]),
        row(Move, 1, &[("en", "Pound")]),
        row(Move, 10, &[("en", "Scratch")]),
        row(Move, 25, &[("en", "Mega Kick")]),
        // Tackle is "Charge" in French: the designed collision with
        // the move actually named Charge.
        row(Move, 33, &[("en", "Tackle"), ("fr", "Charge")]),
        row(Move, 35, &[("en", "Wrap")]),
        row(Move, 118, &[("en", "Metronome")]),
        row(Move, 268, &[("en", "Charge")]),
        row(Item, 1, &[("en", "Master Ball")]),
        row(Item, 4, &[("en", "Poké Ball")]),
        row(Item, 277, &[("en", "Metronome")]),
        row(Ability, 1, &[("en", "Stench")]),
        row(Ability, 50, &[("en", "Run Away")]),
        row(Type, 1, &[("en", "Normal")]),
        row(Type, 10, &[("en", "Fire")]),
        row(Type, 18, &[("en", "???")]),
    ]
}

pub fn build_artifact(dir: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = NameIndexWriter::open_or_create(dir)?;
    for row in rows {
        writer.add_row(row)?;
    }
    writer.commit()?;
    Ok(())
}

/// Engine over the fixture with a freshly built artifact in `dir`.
pub fn engine_with_artifact(dir: &Path) -> Result<LookupEngine> {
    let rows = fixture_rows();
    build_artifact(dir, &rows)?;
    Ok(LookupEngine::new(rows, dir.to_path_buf()))
}

/// Engine pointed at an artifact directory that does not exist.
pub fn engine_without_artifact(dir: &Path) -> LookupEngine {
    LookupEngine::new(fixture_rows(), dir.join("missing"))
}
