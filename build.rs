use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use syntect::dumps::dump_to_uncompressed_file;
use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, css_for_theme_with_class_style};
use two_face::syntax;
use walkdir::WalkDir;

const SYNTAX_THEME: &str = "InspiredGitHub";

fn main() {
    prepare_public_assets().expect("failed to prepare static public assets");

    let static_dir = Path::new("static");
    println!("cargo:rerun-if-changed={}", static_dir.display());
    println!("cargo:rerun-if-changed=templates");

    if static_dir.is_dir() {
        for entry in WalkDir::new(static_dir).into_iter().flatten() {
            println!("cargo:rerun-if-changed={}", entry.path().display());
        }
    }
}

fn prepare_public_assets() -> Result<(), String> {
    let out_dir = PathBuf::from(env::var("OUT_DIR").map_err(|err| err.to_string())?);
    let source_public = Path::new("static").join("public");
    let dest_public = out_dir.join("static_public");

    if dest_public.exists() {
        fs::remove_dir_all(&dest_public)
            .map_err(|err| format!("failed to clean {}: {err}", dest_public.display()))?;
    }

    copy_dir(&source_public, &dest_public)?;
    write_syntax_css(&out_dir, &dest_public.join("styles/syntax.css"))?;
    write_syntax_pack(&out_dir)
}

fn copy_dir(source: &Path, destination: &Path) -> Result<(), String> {
    fs::create_dir_all(destination)
        .map_err(|err| format!("failed to create {}: {err}", destination.display()))?;

    for entry in WalkDir::new(source).into_iter().flatten() {
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| format!("failed to strip prefix: {err}"))?;
        let target_path = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path)
                .map_err(|err| format!("failed to create {}: {err}", target_path.display()))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
            }
            fs::copy(entry.path(), &target_path)
                .map_err(|err| format!("failed to copy {}: {err}", target_path.display()))?;
        }
    }

    Ok(())
}

/// Emit the highlighting stylesheet twice: once into the served bundle and once
/// as a standalone file the print document template inlines.
fn write_syntax_css(out_dir: &Path, public_path: &Path) -> Result<(), String> {
    let theme_set = ThemeSet::load_defaults();
    let theme = theme_set
        .themes
        .get(SYNTAX_THEME)
        .ok_or_else(|| format!("theme `{SYNTAX_THEME}` not found"))?;

    let css = css_for_theme_with_class_style(theme, ClassStyle::SpacedPrefixed { prefix: "syntax-" })
        .map_err(|err| err.to_string())?;

    let mut combined = String::with_capacity(css.len() + 100);
    combined.push_str(&format!(
        "/* --- Syntect theme ({SYNTAX_THEME}), generated at build time --- */\n"
    ));
    combined.push_str(&css);
    combined.push('\n');

    if let Some(parent) = public_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
    }
    fs::write(public_path, &combined)
        .map_err(|err| format!("failed to write {}: {err}", public_path.display()))?;

    let standalone = out_dir.join("syntax.css");
    fs::write(&standalone, &combined)
        .map_err(|err| format!("failed to write {}: {err}", standalone.display()))?;
    println!("cargo:rustc-env=SYNTAX_CSS_FILE={}", standalone.display());

    Ok(())
}

fn write_syntax_pack(out_dir: &Path) -> Result<(), String> {
    let syntax_set = syntax::extra_newlines();
    let pack_path = out_dir.join("syntaxes.packdump");
    dump_to_uncompressed_file(&syntax_set, &pack_path)
        .map_err(|err| format!("failed to encode syntax set: {err}"))?;

    println!("cargo:rustc-env=SYNTAX_PACK_FILE={}", pack_path.display());

    Ok(())
}
