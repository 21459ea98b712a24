use std::process::ExitCode;

fn main() -> ExitCode {
    match spatial_seir::runner::run() {
        Ok(summary) => {
            if let Some(last) = summary.series.last() {
                println!(
                    "Ran {} ticks (seed {}): S={} E={} I={} R={}",
                    last.tick,
                    summary.seed,
                    last.susceptible,
                    last.exposed,
                    last.infected,
                    last.recovered
                );
            }
            if let Some(peak) = summary.peak_infected() {
                println!("Peak infected: {} at tick {}", peak.infected, peak.tick);
            }
            if let Some(path) = &summary.output {
                println!("Series written to {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
