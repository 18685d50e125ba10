//! Show command implementation
//!
//! Prints the provenance of one installed package.

use std::path::Path;

use console::Style;

use super::{GlobalOptions, display_path};
use crate::cli::ShowArgs;
use crate::error::{Result, SourcemarkError};
use crate::metadata::{EggLink, InstalledDistribution, egg_link, find_installed};
use crate::record::{DirectUrl, DirectUrlInfo};

/// Run show command
pub fn run(global: &GlobalOptions, args: ShowArgs) -> Result<()> {
    let site_dir = global.site_dir()?;
    println!("{}", render(&site_dir, &args.name, args.json)?);
    Ok(())
}

/// The text `show` prints for `name`
pub fn render(site_dir: &Path, name: &str, json: bool) -> Result<String> {
    if let Some(dist) = find_installed(site_dir, name)? {
        let direct_url = dist.direct_url()?;
        return if json {
            match &direct_url {
                Some(record) => record.to_json(),
                None => Ok("null".to_string()),
            }
        } else {
            Ok(render_distribution(&dist, direct_url.as_ref()))
        };
    }

    if let Some(link) = egg_link::find(site_dir, name)? {
        return Ok(if json {
            "null".to_string()
        } else {
            render_editable(&link)
        });
    }

    Err(SourcemarkError::DistributionNotFound {
        name: name.to_string(),
    })
}

fn label(text: &str) -> String {
    Style::new().bold().apply_to(text).to_string()
}

fn render_distribution(dist: &InstalledDistribution, direct_url: Option<&DirectUrl>) -> String {
    let mut lines = vec![
        format!("{} {}", label("Name:"), Style::new().bold().yellow().apply_to(&dist.name)),
        format!("{} {}", label("Version:"), dist.version),
        format!("{} {}", label("Location:"), display_path(&dist.dist_info)),
    ];

    let Some(direct_url) = direct_url else {
        lines.push(format!("{} index (no direct URL record)", label("Source:")));
        return lines.join("\n");
    };

    lines.push(format!("{} {}", label("Source:"), direct_url.kind_label()));
    lines.push(format!("{} {}", label("URL:"), direct_url.url));
    match &direct_url.info {
        DirectUrlInfo::Vcs(vcs) => {
            lines.push(format!("{} {}", label("VCS:"), vcs.vcs));
            if let Some(requested) = &vcs.requested_revision {
                lines.push(format!("{} {}", label("Requested revision:"), requested));
            }
            lines.push(format!("{} {}", label("Commit:"), vcs.commit_id));
        }
        DirectUrlInfo::Archive(archive) => {
            let hash = archive.hash.as_deref().unwrap_or("(not recorded)");
            lines.push(format!("{} {}", label("Hash:"), hash));
        }
        DirectUrlInfo::Dir(dir) => {
            lines.push(format!("{} {}", label("Editable:"), dir.editable));
        }
    }
    if let Some(subdirectory) = &direct_url.subdirectory {
        lines.push(format!("{} {}", label("Subdirectory:"), subdirectory));
    }
    lines.join("\n")
}

fn render_editable(link: &EggLink) -> String {
    [
        format!("{} {}", label("Name:"), Style::new().bold().yellow().apply_to(&link.name)),
        format!("{} editable (no direct URL record)", label("Source:")),
        format!("{} {}", label("Location:"), display_path(&link.source)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ProjectMetadata, write_dist_info};
    use crate::record::{AtomicFileWriter, VcsInfo, write_direct_url};
    use crate::source::VcsKind;
    use crate::test_fixtures::create_temp_dir;
    use crate::transaction::Transaction;

    const SHA: &str = "5547fa909e83df8bd743d3978d6667497983a4b7";

    fn install(site: &Path, record: Option<&DirectUrl>) {
        let mut transaction = Transaction::new("test");
        let dist_info = write_dist_info(
            site,
            &ProjectMetadata {
                name: "testpkg".to_string(),
                version: "0.1".to_string(),
            },
            &[],
            &mut transaction,
        )
        .unwrap();
        transaction.commit();
        if let Some(record) = record {
            write_direct_url(&dist_info, record, &AtomicFileWriter).unwrap();
        }
    }

    fn vcs_record() -> DirectUrl {
        DirectUrl {
            url: "file:///tmp/testpkg".to_string(),
            info: DirectUrlInfo::Vcs(VcsInfo {
                vcs: VcsKind::Git,
                commit_id: SHA.to_string(),
                requested_revision: Some("v1.0".to_string()),
            }),
            subdirectory: None,
        }
    }

    #[test]
    fn test_render_vcs_provenance() {
        let site = create_temp_dir();
        install(site.path(), Some(&vcs_record()));

        let text = console::strip_ansi_codes(&render(site.path(), "testpkg", false).unwrap())
            .into_owned();
        assert!(text.contains("URL: file:///tmp/testpkg"));
        assert!(text.contains("Requested revision: v1.0"));
        assert!(text.contains(&format!("Commit: {SHA}")));
    }

    #[test]
    fn test_render_json() {
        let site = create_temp_dir();
        install(site.path(), Some(&vcs_record()));

        let json = render(site.path(), "testpkg", true).unwrap();
        assert_eq!(DirectUrl::from_json(&json).unwrap(), vcs_record());
    }

    #[test]
    fn test_render_without_record() {
        let site = create_temp_dir();
        install(site.path(), None);

        assert_eq!(render(site.path(), "testpkg", true).unwrap(), "null");
        let text = console::strip_ansi_codes(&render(site.path(), "testpkg", false).unwrap())
            .into_owned();
        assert!(text.contains("no direct URL record"));
    }

    #[test]
    fn test_render_missing() {
        let site = create_temp_dir();
        assert!(matches!(
            render(site.path(), "absent", false),
            Err(SourcemarkError::DistributionNotFound { .. })
        ));
    }
}
