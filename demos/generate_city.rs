//! Example: Generate a city
//!
//! Demonstrates the basic usage of the generation pipeline.

use std::collections::BTreeMap;

use rust_city_generator::*;

fn main() {
    println!("City Generation Example");
    println!("=======================\n");

    // Small terrain and lattice for a fast run
    let config = CityConfigBuilder::new()
        .name("Demo City")
        .seed(42)
        .terrain_resolution(6)
        .unwrap()
        .approximate_intersections(16)
        .unwrap()
        .urbanization(1.5)
        .unwrap()
        .build()
        .unwrap();

    println!("Configuration:");
    println!("  Name: {}", config.name);
    println!("  Seed: {}", config.seed);
    println!("  Terrain side length: {}", config.terrain.side_length);
    println!("  Terrain resolution: {}", config.terrain.resolution);
    println!("  Approximate intersections: {}", config.roads.approximate_intersections);
    println!("  Urbanization: {}", config.urbanization);
    println!();

    println!("Generating city...");
    let city = City::generate(config).expect("Failed to generate city");

    let network = city.network();
    let samples: usize = network.roads().values().map(Vec::len).sum();
    println!("Primary network:");
    println!("  Intersections: {}", network.intersections().points().len());
    println!("  Roads: {}", network.roads().len());
    println!("  Road samples: {}", samples);
    println!(
        "  City center: ({:.1}, {:.1})",
        network.city_center().x,
        network.city_center().y
    );
    println!();

    let mut profiles: BTreeMap<CellProfile, usize> = BTreeMap::new();
    for cell in city.cells() {
        *profiles.entry(cell.profile()).or_default() += 1;
    }
    println!("Cells:");
    for (profile, count) in &profiles {
        println!("  {}: {}", profile, count);
    }
    println!();

    println!("Sample cells:");
    for (id, cell) in city.cells().iter().enumerate().take(5) {
        let high = cell.boundary().high();
        let roads = cell.secondary_roads().map_or(0, |g| g.edge_count());
        println!(
            "  Cell {}: {}, area={:.0}, secondary roads={}, blocks={}, lots={}",
            id,
            cell.profile(),
            high.area(),
            roads,
            cell.blocks().len(),
            cell.lots().count()
        );
        if let Some(lake) = cell.lake() {
            println!("    lake with {} basins, water level {:.2}", lake.basins().len(), lake.water_level());
        }
    }
    println!();

    let mut archetypes: BTreeMap<&str, usize> = BTreeMap::new();
    for lot in city.lots() {
        let name = match lot.archetype() {
            Some(BuildingArchetype::Skyscraper) => "skyscraper",
            Some(BuildingArchetype::Office) => "office",
            Some(BuildingArchetype::House) => "house",
            None => "empty",
        };
        *archetypes.entry(name).or_default() += 1;
    }
    println!("Lots:");
    for (name, count) in &archetypes {
        println!("  {}: {}", name, count);
    }

    #[cfg(feature = "spatial-index")]
    {
        let probe = Point::new(500.0, 500.0);
        println!();
        println!("Queries at ({}, {}):", probe.x, probe.y);
        if let Some(p) = city.nearest_intersection(probe) {
            println!("  Nearest intersection: ({:.1}, {:.1})", p.x, p.y);
        }
        match city.find_cell_at(probe) {
            Some(id) => println!("  Inside cell {}", id),
            None => println!("  Outside every cell"),
        }
    }

    println!("\nGeneration complete!");
}
