//! Nonholonomic Wall-Following Planner Example
//!
//! Plans around a block placed straight between start and goal, prints the
//! search diagnostics and saves a plot of the result.
//!
//! Run with `RUST_LOG=nh_planning=debug` for more output. An optional
//! argument names a TOML file with planner parameters.

use nh_planning::path_planning::nh_planner::{NHPlanner, NHPlannerConfig};
use nh_planning::utils::{visualization, GridMap, PointStyle, colors};
use nh_planning::{Point2D, Pose2D, PoseStamped, RoboticsResult};
use tracing_subscriber::EnvFilter;

fn main() -> RoboticsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Nonholonomic Wall-Following Planner Example");
    println!("===========================================\n");

    let config = match std::env::args().nth(1) {
        Some(path) => NHPlannerConfig::from_file(path)?,
        None => NHPlannerConfig::default().with_seed(7).with_t_max(30.0),
    };

    let mut map = GridMap::new(0.0, 0.0, 20.0, 10.0, 0.1, 0.2)?;
    map.add_rectangle(9.0, 3.0, 11.0, 7.0);
    map.add_rectangle(14.0, 0.0, 14.5, 4.0);

    let start = Pose2D::new(2.0, 5.0, 0.0);
    let goal = Pose2D::new(18.0, 2.0, 0.0);

    let planner = NHPlanner::new(&map, config)?;
    let plan = planner.make_plan(
        &PoseStamped::from_pose2d(start, 0.0),
        &PoseStamped::from_pose2d(goal, 0.0),
    )?;

    let stats = &plan.stats;
    println!("Path found with {} poses", plan.poses.len());
    println!("  length:      {:.3} m", stats.path_length);
    println!("  roughness:   {:.4}", stats.roughness);
    println!("  elapsed:     {:?}", stats.elapsed);
    println!("  iterations:  {}", stats.iterations);
    println!("  actions:     {} ({} on corners)", stats.generated_actions, stats.corner_actions);
    println!("  regions:     {}", stats.global_regions);
    println!("  tree nodes:  {}", stats.tree_size);

    let mut vis = visualization::plot_plan(&map, &plan.path, &start, &goal, "Nonholonomic Wall-Following Planner");
    let corners: Vec<Point2D> = [(9.0, 3.0), (11.0, 3.0), (9.0, 7.0), (11.0, 7.0)]
        .iter()
        .map(|&p| p.into())
        .collect();
    vis.plot_points(&corners, &PointStyle::new(colors::CORNER, "Block corners").with_symbol('x'));

    std::fs::create_dir_all("img/path_planning")?;
    if let Err(e) = vis.save_png("img/path_planning/nh_planner.png", 800, 500) {
        eprintln!("Failed to save PNG: {}", e);
    }

    println!("\nNonholonomic planner example finished!");
    Ok(())
}
