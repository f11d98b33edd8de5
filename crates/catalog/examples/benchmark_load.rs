use catalog::{Catalog, GenreMatch, MovieCatalog};
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/ml-latest-small");

    println!("Loading MovieLens catalog...\n");

    let start = Instant::now();
    let catalog = MovieCatalog::load_from_dir(data_dir)
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let (movies, genres) = catalog.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Genres: {}", genres);

    let seed = catalog.random_entry().expect("Catalog is empty");
    let start = Instant::now();
    for _ in 0..1000 {
        let _ = catalog.batch(&seed.genres, GenreMatch::Exclude, 32);
    }
    println!("\n1000 exclude batches for {:?}: {:?}", seed.genres, start.elapsed());
}
