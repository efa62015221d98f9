use quadlife::World;
use quadlife::parse_rle;

#[test]
fn test_patterns() -> anyhow::Result<()> {
    let pattern_dir = std::fs::read_dir("tests/rle_pats")?;
    let mut tested = 0;
    let mut failed = Vec::new();

    for entry in pattern_dir {
        let path = entry?.path();
        let bytes = std::fs::read(&path)?;

        match parse_rle::read_rle(&bytes, |_x, _y| {}) {
            Ok(_) => tested += 1,
            Err(e) => failed.push((path.clone(), e)),
        }
    }

    if !failed.is_empty() {
        for (path, err) in &failed {
            eprintln!("Failed to parse {:?}: {:#}", path, err);
        }

        panic!(
            "{}/{} patterns failed to parse",
            failed.len(),
            tested + failed.len()
        );
    }

    println!("Successfully parsed {} RLE patterns", tested);

    Ok(())
}

fn load(name: &str) -> anyhow::Result<World> {
    let bytes = std::fs::read(format!("tests/rle_pats/{name}"))?;
    let mut world = World::with_depth(8)?;
    world.load_rle(&bytes)?;

    Ok(world)
}

#[test]
fn populations() -> anyhow::Result<()> {
    for (name, population) in [
        ("glider.rle", 5),
        ("blinker.rle", 3),
        ("gosper_glider_gun.rle", 36),
        ("r_pentomino.rle", 5),
        ("pulsar.rle", 48),
    ] {
        assert_eq!(load(name)?.population(), population, "{name}");
    }

    Ok(())
}

#[test]
fn offset_lines_move_the_pattern() -> anyhow::Result<()> {
    let world = load("r_pentomino.rle")?;

    assert_eq!(
        world.live_cells(),
        vec![(-1, 0), (0, -1), (0, 0), (0, 1), (1, -1)]
    );

    Ok(())
}

#[test]
fn pulsar_has_period_3() -> anyhow::Result<()> {
    let mut world = load("pulsar.rle")?;
    let start = world.live_cells();

    world.step()?;
    assert_ne!(world.live_cells(), start);

    world.step_n(2)?;
    assert_eq!(world.live_cells(), start);

    Ok(())
}

#[test]
fn gun_fires_a_glider_every_30_generations() -> anyhow::Result<()> {
    let mut world = load("gosper_glider_gun.rle")?;

    world.step_n(60)?;
    let population = world.population();

    world.step_n(30)?;
    assert_eq!(world.population(), population + 5);

    world.step_n(30)?;
    assert_eq!(world.population(), population + 10);

    Ok(())
}

#[test]
fn file_metadata() -> anyhow::Result<()> {
    let bytes = std::fs::read("tests/rle_pats/gosper_glider_gun.rle")?;
    let file = parse_rle::read_rle(&bytes, |_, _| {})?;

    assert_eq!(file.name, Some(b"Gosper glider gun".as_slice()));
    assert_eq!(file.author, Some(b"Bill Gosper".as_slice()));
    assert_eq!(file.size, Some((36, 9)));
    assert!(file.set.is_life());

    Ok(())
}
