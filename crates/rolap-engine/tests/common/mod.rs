#![allow(dead_code)]

use rolap_engine::{
    CellReader, FlatMemberCache, Hierarchy, InMemoryMemberSource, Member, MemberKey, MemberReader,
    OlapResult, RolapEvaluator,
};
use std::collections::HashMap;
use std::sync::Arc;

/// `[All, Country, City]` with All -> {USA -> {NYC, LA}, Canada -> {Toronto}}.
pub fn geography_source() -> InMemoryMemberSource {
    let all = MemberKey::root("All");
    let usa = all.child("USA");
    let canada = all.child("Canada");
    let hierarchy = Hierarchy::new("Geography", vec!["All", "Country", "City"]).with_all_level();
    InMemoryMemberSource::new(hierarchy)
        .with_member(all.clone(), "All Geography")
        .with_member(usa.clone(), "USA")
        .with_member(usa.child("NYC"), "NYC")
        .with_member(usa.child("LA"), "LA")
        .with_member(canada.clone(), "Canada")
        .with_member(canada.child("Toronto"), "Toronto")
}

pub fn geography() -> FlatMemberCache {
    FlatMemberCache::load(&geography_source()).unwrap()
}

/// Flat `[Year]` hierarchy with roots 2020..=2024; defaults to 2022.
pub fn years() -> FlatMemberCache {
    let hierarchy = Hierarchy::new("Time", vec!["Year"])
        .with_default_member(MemberKey::root(2022));
    let mut source = InMemoryMemberSource::new(hierarchy);
    for year in 2020..=2024 {
        source = source.with_member(MemberKey::root(year), year.to_string());
    }
    FlatMemberCache::load(&source).unwrap()
}

pub fn by_name(cache: &FlatMemberCache, name: &str) -> Arc<Member> {
    cache
        .members()
        .iter()
        .find(|m| m.name() == name)
        .cloned()
        .unwrap_or_else(|| panic!("no member named {name}"))
}

pub fn names(members: &[Arc<Member>]) -> Vec<String> {
    members.iter().map(|m| m.name().to_string()).collect()
}

/// Cells keyed by the names of the coordinate members, joined with `/`.
#[derive(Debug, Default)]
pub struct MapCells {
    cells: HashMap<String, f64>,
}

impl MapCells {
    pub fn with(mut self, coordinates: &[&str], value: f64) -> Self {
        self.cells.insert(coordinates.join("/"), value);
        self
    }
}

impl CellReader for MapCells {
    fn cell_value(&self, coordinates: &[Arc<Member>]) -> OlapResult<Option<f64>> {
        let key: Vec<&str> = coordinates.iter().map(|m| m.name()).collect();
        Ok(self.cells.get(&key.join("/")).copied())
    }
}

/// Evaluator over Geography and Time with per-city sales for 2022 and 2023.
pub fn sales_evaluator() -> (RolapEvaluator, Arc<FlatMemberCache>, Arc<FlatMemberCache>) {
    let geography = Arc::new(geography());
    let years = Arc::new(years());
    let cells = MapCells::default()
        .with(&["NYC", "2022"], 10.0)
        .with(&["LA", "2022"], 20.0)
        .with(&["Toronto", "2022"], 5.0)
        .with(&["NYC", "2023"], 12.0)
        .with(&["USA", "2022"], 30.0)
        .with(&["Canada", "2022"], 5.0);
    let mut ev = RolapEvaluator::new(Arc::new(cells));
    ev.add_hierarchy(geography.clone() as Arc<dyn MemberReader>)
        .unwrap();
    ev.add_hierarchy(years.clone() as Arc<dyn MemberReader>).unwrap();
    (ev, geography, years)
}
