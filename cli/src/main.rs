//! A small multi-tool for inspecting what the lane model derives from a
//! network fixture, in JSON for downstream rendering or debugging.

#[macro_use]
extern crate log;

mod dump;
mod fixture;

use anyhow::Result;
use structopt::StructOpt;

use laneutil::Timer;

#[derive(StructOpt)]
#[structopt(name = "lanes_cli", about = "The lane model multi-tool")]
enum Command {
    /// Print every way's derived cross-section as JSON
    DumpCrossSections {
        /// The path to a network fixture
        #[structopt(long)]
        input: String,
    },
    /// Print all junctions and their right-of-way as JSON
    DumpJunctions {
        #[structopt(long)]
        input: String,
    },
    /// Print the offset polylines for drawing one way's pieces
    OffsetCurves {
        #[structopt(long)]
        input: String,
        /// The way to dump
        #[structopt(long)]
        way: i64,
    },
}

fn main() -> Result<()> {
    laneutil::logger::setup();
    let cmd = Command::from_args();
    let mut timer = Timer::new("run the lane model");
    match cmd {
        Command::DumpCrossSections { input } => {
            let network = fixture::load(&input, &mut timer)?;
            dump::cross_sections(&network);
        }
        Command::DumpJunctions { input } => {
            let network = fixture::load(&input, &mut timer)?;
            dump::junctions(&network);
        }
        Command::OffsetCurves { input, way } => {
            let network = fixture::load(&input, &mut timer)?;
            dump::offset_curves(&network, lane_model::osm::WayID(way));
        }
    }
    Ok(())
}
