use serde::Deserialize;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct TileTable {
    tile_count: u16,
    frame_important: Vec<u16>,
    #[serde(default)]
    no_batching: Vec<u16>,
}

fn write_id_table(out_file: &mut File, name: &str, ids: &[u16]) {
    writeln!(out_file, "pub static {}: &[u16] = &[", name).unwrap();
    for chunk in ids.chunks(16) {
        let row: Vec<String> = chunk.iter().map(|id| id.to_string()).collect();
        writeln!(out_file, "    {},", row.join(", ")).unwrap();
    }
    writeln!(out_file, "];").unwrap();
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let tiles_json_path = Path::new(&manifest_dir).join("tiles.json");
    let tiles_json = fs::read_to_string(&tiles_json_path).expect("Failed to read tiles.json");

    let mut table: TileTable =
        serde_json::from_str(&tiles_json).expect("Failed to parse tiles.json");

    for id in table.frame_important.iter().chain(table.no_batching.iter()) {
        assert!(
            *id < table.tile_count,
            "tile id {} is outside tile_count {}",
            id,
            table.tile_count
        );
    }
    table.frame_important.sort_unstable();
    table.frame_important.dedup();
    table.no_batching.sort_unstable();
    table.no_batching.dedup();

    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("tile_table.rs");
    let mut out_file = File::create(&dest_path).expect("Failed to create tile_table.rs");

    writeln!(&mut out_file, "pub const TILE_COUNT: u16 = {};", table.tile_count).unwrap();
    write_id_table(&mut out_file, "FRAME_IMPORTANT", &table.frame_important);
    write_id_table(&mut out_file, "NO_BATCHING", &table.no_batching);

    println!("cargo:rerun-if-changed={}", tiles_json_path.display());
}
