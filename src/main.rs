use std::{
    env,
    io::{BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use handsign::camera::{Webcam, WebcamOptions};
use handsign::classifier::OnnxClassifier;
use handsign::collect::{CollectEvent, CollectSession, CollectTarget, Signal};
use handsign::hand::OnnxLandmarker;
use handsign::recognize::Recognizer;
use handsign::{dataset, labels};

fn main() -> anyhow::Result<()> {
    handsign::init_logger!();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("detect") => detect(),
        Some("collect") => {
            let target = args
                .next()
                .context("`collect` needs a target (`letters`, `numbers`, `all`, a letter, or a digit)")?
                .parse::<CollectTarget>()?;
            collect(target)
        }
        Some("dataset") => build_dataset(),
        _ => {
            eprintln!("usage: handsign <detect | collect <target> | dataset>");
            std::process::exit(1);
        }
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    env::var_os(var).map_or_else(|| PathBuf::from(default), PathBuf::from)
}

fn landmarker() -> anyhow::Result<OnnxLandmarker> {
    OnnxLandmarker::load(env_path("HANDSIGN_LANDMARKER", "hand_landmark.onnx"))
}

fn detect() -> anyhow::Result<()> {
    let landmarker = landmarker()?;
    let classifier = OnnxClassifier::load(env_path("HANDSIGN_MODEL", "model.onnx"))?;
    let webcam = Webcam::open(WebcamOptions::default().fps(30))?;

    let mut recognizer = Recognizer::new();
    recognizer.set_classifier(Arc::new(classifier));
    let receiver = recognizer.start(webcam, landmarker)?;

    let mut last = None;
    for recognition in receiver.iter() {
        if recognition.symbol != last {
            match recognition.symbol {
                Some(symbol) => log::info!("recognized '{symbol}'"),
                None => log::info!("no hand in view"),
            }
            last = recognition.symbol;
        }
    }
    recognizer.stop();
    Ok(())
}

fn collect(target: CollectTarget) -> anyhow::Result<()> {
    let webcam = Webcam::open(WebcamOptions::default().fps(30))?;
    let data_dir = env_path("HANDSIGN_DATA", "data");

    let (signal_tx, signal_rx) = crossbeam::channel::unbounded();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let signal = match line.as_deref() {
                    Ok("q" | "Q") | Err(_) => Signal::Cancel,
                    Ok(_) => Signal::Begin,
                };
                if signal_tx.send(signal).is_err() || signal == Signal::Cancel {
                    break;
                }
            }
        })?;

    let (event_tx, event_rx) = crossbeam::channel::unbounded();
    let printer = std::thread::Builder::new()
        .name("progress".into())
        .spawn(move || {
            let mut previewing = None;
            for event in event_rx.iter() {
                match event {
                    CollectEvent::Preview { class, .. } => {
                        if previewing != Some(class) {
                            let symbol = labels::symbol(class).unwrap_or('?');
                            println!("class {class} ('{symbol}'): press Enter to capture, q to quit");
                            previewing = Some(class);
                        }
                    }
                    CollectEvent::Captured { class, index, .. } => {
                        print!("\rclass {class}: captured {}", index + 1);
                        let _ = std::io::stdout().flush();
                    }
                    CollectEvent::ClassDone { class } => {
                        println!("\rclass {class}: done          ");
                    }
                }
            }
        })?;

    let result = CollectSession::new(data_dir).run(webcam, target, &signal_rx, &event_tx);
    drop(event_tx);
    let _ = printer.join();
    result
}

fn build_dataset() -> anyhow::Result<()> {
    let data_dir = env_path("HANDSIGN_DATA", "data");
    let out_path = env_path("HANDSIGN_DATASET", "dataset.csv");

    let records = dataset::build(&data_dir, landmarker()?)?;
    log::info!(
        "extracted {} feature vectors, writing {}",
        records.len(),
        out_path.display(),
    );
    let file = std::fs::File::create(&out_path)?;
    dataset::write_csv(&records, std::io::BufWriter::new(file))?;
    Ok(())
}
