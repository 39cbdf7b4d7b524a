use std::env;
use std::fs;
use std::process;

fn usage() -> ! {
    eprintln!("Usage: tunescore <input> [output]");
    eprintln!("       tunescore --yaml <input> [output]");
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage();
    }

    let mut yaml = false;
    let mut input_path = &args[1];
    let mut output_path: Option<&String> = args.get(2);

    // Parse flags
    if args[1] == "--yaml" {
        yaml = true;
        if args.len() < 3 {
            usage();
        }
        input_path = &args[2];
        output_path = args.get(3);
    }

    // Read input file
    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let score = tunescore::parse_score(&source);
    tracing::info!(
        notes = score.notes.len(),
        total_steps = score.total_steps,
        "parsed score"
    );

    let rendered = if yaml {
        serde_yaml::to_string(&score).map_err(|e| e.to_string())
    } else {
        serde_json::to_string_pretty(&score).map_err(|e| e.to_string())
    };

    let rendered = match rendered {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error serializing score: {}", e);
            process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &rendered) {
                eprintln!("Error writing to '{}': {}", path, e);
                process::exit(1);
            }
            eprintln!("Wrote schedule to {}", path);
        }
        None => {
            println!("{}", rendered);
        }
    }
}
