use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("mdflowy")
        .version(env!("CARGO_PKG_VERSION"))
        .author("mdflowy Contributors")
        .about("Render the Markdown preview of an outliner page snapshot")
        .arg(clap::arg!(<INPUT> "Page snapshot (HTML file, or '-' for stdin)"))
        .arg(
            clap::arg!(--then <SNAPSHOT> "Later snapshot of the same page, replayed as a change")
                .value_name("SNAPSHOT")
                .action(clap::ArgAction::Append)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (markdown, html, text, page)")
                .value_name("FORMAT")
                .default_value("html")
                .value_parser(["markdown", "html", "text", "page"]),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--plain "Flatten host formatting to plain text before rendering"))
        .arg(clap::arg!(--no_linkify "Do not turn bare URLs into links"))
        .arg(clap::arg!(--math "Typeset $...$ and $$...$$ formulas"))
        .arg(clap::arg!(--theme <NAME> "Highlight theme for code blocks").value_name("NAME"))
        .arg(
            clap::arg!(--config <FILE> "Config file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "zsh", "fish", "powershell"]),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "mdflowy", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "mdflowy", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "mdflowy", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "mdflowy", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
