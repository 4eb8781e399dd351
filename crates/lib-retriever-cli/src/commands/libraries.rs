use crate::config::AppConfig;

/// One line per configured library: name, default version, URL template.
pub fn format_libraries(config: &AppConfig) -> Vec<String> {
    config
        .libraries
        .iter()
        .map(|lib| {
            format!(
                "{}\t{}\t{}",
                lib.name,
                lib.default_version.as_deref().unwrap_or("-"),
                lib.retriever.http_url.as_deref().unwrap_or("(no URL)")
            )
        })
        .collect()
}

pub fn run(config: &AppConfig) {
    let lines = format_libraries(config);
    if lines.is_empty() {
        eprintln!("No libraries configured.");
        return;
    }
    for line in lines {
        println!("{line}");
    }
}
