use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use ftk_model::FeModel;
use ftk_repair::{Pipeline, PipelineConfig, PipelineReport, SanityOptions, SanityReport, Stage};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("usage:");
    eprintln!("  ftk-cli inspect <model> [--verbose]");
    eprintln!(
        "  ftk-cli repair <model> [--out <file.json>] [--stages a,b,...] [--audit <file.csv>]"
    );
    eprintln!("                 [--report <file.json>] [--dry-run] [--debug] [--verbose]");
    eprintln!("  ftk-cli convert <model.inp> <out.json>");
    eprintln!();
    eprintln!("models ending in .json load as snapshots, anything else as a keyword deck");
    let names: Vec<&str> = Stage::ALL.iter().map(Stage::as_str).collect();
    eprintln!("stages: {}", names.join(", "));
}

#[derive(Debug, Clone, PartialEq)]
struct RepairArgs {
    model: PathBuf,
    out: Option<PathBuf>,
    audit: Option<PathBuf>,
    report: Option<PathBuf>,
    stages: Option<Vec<Stage>>,
    dry_run: bool,
    debug: bool,
    verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Inspect { model: PathBuf, verbose: bool },
    Repair(RepairArgs),
    Convert { input: PathBuf, output: PathBuf },
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some((command, rest)) = args.split_first() else {
        return Err("missing command".to_string());
    };

    match command.as_str() {
        "inspect" => {
            let mut model = None;
            let mut verbose = false;
            for arg in rest {
                match arg.as_str() {
                    "--verbose" | "-v" => verbose = true,
                    flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
                    path if model.is_none() => model = Some(PathBuf::from(path)),
                    extra => return Err(format!("unexpected argument {extra}")),
                }
            }
            let model = model.ok_or("inspect needs a model file")?;
            Ok(Command::Inspect { model, verbose })
        }
        "repair" => parse_repair(rest).map(Command::Repair),
        "convert" => match rest {
            [input, output] => Ok(Command::Convert {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
            }),
            _ => Err("convert needs <model.inp> <out.json>".to_string()),
        },
        other => Err(format!("unknown command {other}")),
    }
}

fn parse_repair(rest: &[String]) -> Result<RepairArgs, String> {
    let mut model = None;
    let mut parsed = RepairArgs {
        model: PathBuf::new(),
        out: None,
        audit: None,
        report: None,
        stages: None,
        dry_run: false,
        debug: false,
        verbose: false,
    };

    let mut it = rest.iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .map(PathBuf::from)
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--out" => parsed.out = Some(value("--out")?),
            "--audit" => parsed.audit = Some(value("--audit")?),
            "--report" => parsed.report = Some(value("--report")?),
            "--stages" => {
                let list = value("--stages")?;
                parsed.stages = Some(parse_stages(&list.to_string_lossy())?);
            }
            "--dry-run" => parsed.dry_run = true,
            "--debug" => parsed.debug = true,
            "--verbose" | "-v" => parsed.verbose = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            path if model.is_none() => model = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument {extra}")),
        }
    }

    parsed.model = model.ok_or("repair needs a model file")?;
    Ok(parsed)
}

fn parse_stages(list: &str) -> Result<Vec<Stage>, String> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Stage>().map_err(|err| err.to_string()))
        .collect()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a second init in the same process is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load(path: &Path) -> Result<FeModel, String> {
    ftk_io::load_model(path).map_err(|err| format!("{}: {err}", path.display()))
}

fn print_sanity(label: &str, report: &SanityReport) {
    println!("{label}: {:?}", report.worst());
    for result in &report.results {
        println!("  {:?} {:?}: {}", result.verdict, result.check, result.message);
    }
}

fn print_pipeline(report: &PipelineReport) {
    print_sanity("baseline", &report.baseline);
    for stage in &report.stages {
        println!(
            "stage {}: nodes {} -> {}, elements {} -> {}",
            stage.stage,
            stage.nodes_before,
            stage.nodes_after,
            stage.elements_before,
            stage.elements_after
        );
        if let Some(sanity) = &stage.sanity {
            print_sanity("  sanity", sanity);
        }
    }
}

fn inspect_file(path: &Path) -> Result<(), String> {
    let model = load(path)?;
    println!("model: {}", path.display());
    println!("{}", model.statistics().format());
    let report = ftk_repair::inspect::sanity::inspect(&model, &SanityOptions::default(), None);
    print_sanity("sanity", &report);
    Ok(())
}

fn repair_file(args: &RepairArgs) -> Result<(), String> {
    let mut model = load(&args.model)?;
    let mut config = PipelineConfig::default()
        .with_dry_run(args.dry_run)
        .with_debug(args.debug);
    if let Some(stages) = &args.stages {
        config = config.with_stages(stages.iter().copied());
    }

    println!("repair started {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let report = Pipeline::new(config)
        .run(&mut model, None)
        .map_err(|err| format!("pipeline failed: {err}"))?;
    print_pipeline(&report);
    println!("{}", model.statistics().format());

    if let Some(out) = &args.out {
        if args.dry_run {
            tracing::warn!("dry run: model left unchanged, {} still written", out.display());
        }
        ftk_io::save_snapshot(out, &model).map_err(|err| format!("{}: {err}", out.display()))?;
        println!("model written to {}", out.display());
    }
    if let Some(audit) = &args.audit {
        ftk_io::write_merge_audit_csv(audit, report.merge_audit())
            .map_err(|err| format!("{}: {err}", audit.display()))?;
        println!("merge audit written to {}", audit.display());
    }
    if let Some(path) = &args.report {
        let bytes = serde_json::to_vec_pretty(&report)
            .map_err(|err| format!("failed to encode report: {err}"))?;
        std::fs::write(path, bytes).map_err(|err| format!("{}: {err}", path.display()))?;
        println!("report written to {}", path.display());
    }
    Ok(())
}

fn convert_file(input: &Path, output: &Path) -> Result<(), String> {
    let model = ftk_io::load_deck_file(input).map_err(|err| format!("{}: {err}", input.display()))?;
    ftk_io::save_snapshot(output, &model).map_err(|err| format!("{}: {err}", output.display()))?;
    println!(
        "converted {} nodes and {} elements to {}",
        model.nodes.len(),
        model.elements.len(),
        output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err}");
            usage();
            return ExitCode::from(2);
        }
    };

    let result = match &command {
        Command::Inspect { model, verbose } => {
            init_tracing(*verbose);
            inspect_file(model)
        }
        Command::Repair(args) => {
            init_tracing(args.verbose);
            repair_file(args)
        }
        Command::Convert { input, output } => {
            init_tracing(false);
            convert_file(input, output)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_repair_with_options() {
        let cmd = parse_args(&args(&[
            "repair",
            "frame.inp",
            "--stages",
            "duplicate, intersection",
            "--out",
            "fixed.json",
            "--dry-run",
        ]))
        .expect("valid command line");
        let Command::Repair(repair) = cmd else {
            panic!("expected repair, got {cmd:?}");
        };
        assert_eq!(repair.model, PathBuf::from("frame.inp"));
        assert_eq!(repair.out, Some(PathBuf::from("fixed.json")));
        assert_eq!(
            repair.stages,
            Some(vec![Stage::DuplicateMerge, Stage::IntersectionSplit])
        );
        assert!(repair.dry_run);
        assert!(!repair.verbose);
    }

    #[test]
    fn rejects_unknown_stage() {
        let err = parse_args(&args(&["repair", "m.inp", "--stages", "weld"]))
            .expect_err("unknown stage");
        assert!(err.contains("weld"), "{err}");
    }

    #[test]
    fn rejects_missing_option_value() {
        assert!(parse_args(&args(&["repair", "m.inp", "--out"])).is_err());
    }

    #[test]
    fn convert_needs_two_paths() {
        assert!(parse_args(&args(&["convert", "m.inp"])).is_err());
        assert_eq!(
            parse_args(&args(&["convert", "m.inp", "m.json"])).expect("valid"),
            Command::Convert {
                input: PathBuf::from("m.inp"),
                output: PathBuf::from("m.json"),
            }
        );
    }

    #[test]
    fn inspect_accepts_verbose_flag() {
        assert_eq!(
            parse_args(&args(&["inspect", "-v", "m.json"])).expect("valid"),
            Command::Inspect {
                model: PathBuf::from("m.json"),
                verbose: true,
            }
        );
        assert!(parse_args(&args(&["inspect"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
    }
}
