use astar_visualizer::{run_paced, GridSize, SearchEngine, StepResult, VisualizerConfig};
use grid_util::point::Point;
use std::ops::ControlFlow;

// Steps through a search on the following grid, printing it after every expansion:
// ...............
// .S.....#.......
// .......#.......
// .......#.......
// .......#....E..
// .......#.......
// ...............
fn main() {
    let config = VisualizerConfig::new(GridSize::Custom {
        width: 15,
        height: 7,
    })
    .with_speed(0.5)
    .with_debug(true);
    let mut engine = SearchEngine::new(config);
    let start = Point::new(1, 1);
    let end = Point::new(12, 4);
    println!("{}", engine.header());
    engine.select_cell(start).unwrap();
    println!("{}", engine.header());
    engine.select_cell(end).unwrap();
    println!("{}", engine.header());
    for y in 1..6 {
        engine.select_cell(Point::new(7, y)).unwrap();
    }

    let result = run_paced(&mut engine, |engine, _| {
        println!("{}", engine.header());
        if let Some(head) = engine.frontier_head() {
            println!("Next: ({}, {})", head.x, head.y);
        }
        println!("{}", engine.grid());
        ControlFlow::Continue(())
    })
    .unwrap();

    if result == StepResult::Found {
        let path = engine.path().unwrap();
        println!("Path of {} steps:", path.len() - 1);
        for p in path {
            let cell = engine.cell(*p).unwrap();
            match (engine.config().debug, cell.debug_label()) {
                (true, Some((g, f, h))) => println!("({}, {}) g={g} f={f} h={h}", p.x, p.y),
                _ => println!("({}, {})", p.x, p.y),
            }
        }
        println!("Cost: {:?}", engine.path_cost());
    }
}
