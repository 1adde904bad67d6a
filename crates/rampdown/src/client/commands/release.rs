use clap::Parser;

use execvnode::{ReleaseRequest, SelectSpec};

use crate::client::globalsettings::GlobalSettings;

#[derive(Parser)]
pub struct ReleaseOpts {
    /// Id of the running job
    #[arg(short = 'j', long)]
    job: String,

    /// Release all vnodes that are not on the primary execution host
    #[arg(short = 'a', long, conflicts_with_all(["keep_select", "vnodes"]))]
    all: bool,

    /// Keep only the vnodes needed to satisfy this select specification
    #[arg(short = 'k', long, conflicts_with("vnodes"))]
    keep_select: Option<SelectSpec>,

    /// Vnodes to release
    vnodes: Vec<String>,
}

impl ReleaseOpts {
    fn into_request(self) -> anyhow::Result<(String, ReleaseRequest)> {
        let request = if self.all {
            ReleaseRequest::All
        } else if let Some(select) = self.keep_select {
            ReleaseRequest::KeepSelect(select)
        } else if !self.vnodes.is_empty() {
            ReleaseRequest::Explicit(self.vnodes)
        } else {
            anyhow::bail!("Specify vnodes to release, `--all` or `--keep-select`");
        };
        Ok((self.job, request))
    }
}

pub fn command_release(gsettings: &GlobalSettings, opts: ReleaseOpts) -> anyhow::Result<()> {
    let (job_id, request) = opts.into_request()?;
    let mut session = gsettings.open_session()?;
    let released = session
        .state_mut()
        .release_job(&job_id, &request, gsettings.config())?;
    session.commit(Some(&job_id), &released.records)?;
    gsettings.printer().print_release(&job_id, &released);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<(String, ReleaseRequest)> {
        let mut argv = vec!["release"];
        argv.extend_from_slice(args);
        ReleaseOpts::try_parse_from(argv)?.into_request()
    }

    #[test]
    fn test_release_modes() {
        assert_eq!(
            parse(&["-j", "1.server", "nB", "nC"]).unwrap(),
            (
                "1.server".to_string(),
                ReleaseRequest::Explicit(vec!["nB".to_string(), "nC".to_string()])
            )
        );
        assert_eq!(parse(&["-j", "1.server", "-a"]).unwrap().1, ReleaseRequest::All);
        assert_eq!(
            parse(&["-j", "1.server", "-k", "ncpus=2+ncpus=1"])
                .unwrap()
                .1
                .mode_name(),
            "keep_select"
        );
    }

    #[test]
    fn test_release_modes_are_exclusive() {
        assert!(parse(&["-j", "1.server", "-a", "nB"]).is_err());
        assert!(parse(&["-j", "1.server", "-a", "-k", "ncpus=1"]).is_err());
        assert!(parse(&["-j", "1.server"]).is_err());
        assert!(parse(&["-j", "1.server", "-k", "0:ncpus=1"]).is_err());
    }
}
