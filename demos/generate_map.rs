//! Example: Generate a patch of map with the full processor pipeline
//!
//! Logs section generation to the terminal and prints a small ASCII
//! rendering of one chunk row per block.

use rust_voronoi_map::*;
use slog::{o, Drain, Logger};

fn main() {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let log = Logger::root(drain, o!("demo" => "generate_map"));

    let config = MapConfigBuilder::new()
        .seed(42)
        .section_size(256, 256)
        .unwrap()
        .chunk_size(32, 32)
        .unwrap()
        .build()
        .unwrap();

    println!("Voronoi Map Generation Example");
    println!("==============================\n");
    println!("  Seed: {}", config.seed);
    println!("  Section size: {}", config.section_size);
    println!("  Chunk size: {}\n", config.chunk_size);

    let mut map = CellMap::builder(config)
        .points_generator(JitteredGridPointsGenerator::new(40..=60))
        .polygon_generator(VoronoiPolygonGenerator::new())
        .add_processor(OceanLandProcessor::new(PerlinHeightSampler::new(config.seed)))
        .add_processor(DistanceToOceanProcessor::default())
        .add_processor(RiverProcessor::new())
        .add_processor(MoistureProcessor::new())
        .add_chunk_processor(EdgeDistanceProcessor::new().with_max_distance(2))
        .logger(log)
        .build()
        .expect("Failed to build map");

    let area = Rectanglei::new(IVec2::new(-256, -256), IVec2::new(256, 256));
    let mut view = map.get_sub_view(area);

    let ocean = view
        .cells()
        .filter(|&id| map.cell(id).and_then(|c| c.get(&keys::IS_OCEAN)) == Some(&true))
        .count();
    let river_edges = view
        .edges()
        .filter(|&id| map.edge(id).and_then(|e| e.get(&keys::IS_RIVER)) == Some(&true))
        .count();
    let moisture: f64 = view
        .cells()
        .filter_map(|id| map.cell(id).and_then(|c| c.get(&keys::MOISTURE)).copied())
        .sum();

    println!("Statistics:");
    println!("  Cells: {} ({} ocean)", view.cell_count(), ocean);
    println!("  Corners: {}", view.corner_count());
    println!("  Edges: {} ({} river)", view.edge_count(), river_edges);
    println!("  Average moisture: {:.3}", moisture / view.cell_count().max(1) as f64);
    println!("  Sections cached: {}\n", map.section_count());

    println!("Chunk (0, 0), one character per 2x2 blocks:");
    let rows: Vec<(CellId, bool)> = {
        let chunk = map.get_chunk(0, 0);
        let size = chunk.size();
        let borders = chunk.get(&keys::EDGE_DISTANCE);
        (0..size.y)
            .step_by(2)
            .flat_map(|y| (0..size.x).step_by(2).map(move |x| (x, y)))
            .map(|(x, y)| {
                let border = borders.map_or(false, |data| data.distance(x, y) == Some(0));
                (chunk.cell(x, y), border)
            })
            .collect()
    };
    for row in rows.chunks(16) {
        let line: String = row
            .iter()
            .map(|&(id, border)| match map.cell(id).and_then(|c| c.get(&keys::DISTANCE_TO_OCEAN)).copied() {
                _ if border => '+',
                Some(d) if d <= 0 => '~',
                Some(1) => '.',
                Some(_) => '#',
                None => '?',
            })
            .collect();
        println!("  {}", line);
    }

    view.release();
    map.release_chunk(0, 0);
    let evicted = map.evict_unreferenced();
    println!("\nEvicted {} sections, {} remain", evicted, map.section_count());
}
