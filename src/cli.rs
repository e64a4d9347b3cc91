use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, GeneratorConfig, OutputConfig, Signal};

/// Render templates from running containers and keep them up to date.
#[derive(Debug, Parser)]
#[command(name = "container-gen", version)]
pub struct Cli {
    /// Template to render.
    pub template: Option<PathBuf>,

    /// Where to write the rendered template. Writes to stdout if omitted.
    pub dest: Option<PathBuf>,

    /// TOML config file with `[[config]]` outputs. May be repeated.
    #[arg(long = "config", value_name = "FILE")]
    pub config_files: Vec<PathBuf>,

    /// Regenerate whenever a container starts, stops or dies.
    #[arg(long)]
    pub watch: bool,

    /// Shell command to run after the output changed.
    #[arg(long, value_name = "CMD", default_value = "")]
    pub notify: String,

    /// Send SIGHUP to this container after the output changed. May be repeated.
    #[arg(long = "notify-sighup", value_name = "CONTAINER")]
    pub notify_sighup: Vec<String>,

    /// Only include containers with exposed ports.
    #[arg(long)]
    pub only_exposed: bool,

    /// Only include containers with published ports.
    #[arg(long)]
    pub only_published: bool,

    /// Regenerate every N seconds, 0 disables.
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub interval: u64,

    /// Keep blank lines in the output.
    #[arg(long)]
    pub keep_blank_lines: bool,

    /// Docker API endpoint, e.g. `unix:///var/run/docker.sock` or `tcp://127.0.0.1:2375`.
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long, value_name = "FILE")]
    pub tlscert: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub tlskey: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub tlscacert: Option<PathBuf>,

    /// Verify the daemon certificate against the CA cert.
    #[arg(long, env = "DOCKER_TLS_VERIFY")]
    pub tlsverify: bool,
}

impl Cli {
    /// Loads the config files, then applies the flags on top.
    ///
    /// # Errors
    ///
    /// Returns a [`config::Error`] if a config file cannot be loaded or the result is invalid.
    pub fn into_config(self) -> config::Result<GeneratorConfig> {
        let mut config = GeneratorConfig::default();
        for path in &self.config_files {
            config.load_file(path)?;
        }

        if let Some(template) = self.template {
            let mut output = OutputConfig::new(template);
            output.dest = self.dest;
            output.watch = self.watch;
            output.notify_cmd = self.notify;
            output.notify_containers = self
                .notify_sighup
                .into_iter()
                .map(|container| (container, Signal::SIGHUP))
                .collect();
            output.only_exposed = self.only_exposed;
            output.only_published = self.only_published;
            output.interval = self.interval;
            output.keep_blank_lines = self.keep_blank_lines;
            config.outputs.push(output);
        }

        if self.endpoint.is_some() {
            config.endpoint = self.endpoint;
        }
        if self.tlscert.is_some() {
            config.tls.cert = self.tlscert;
        }
        if self.tlskey.is_some() {
            config.tls.key = self.tlskey;
        }
        if self.tlscacert.is_some() {
            config.tls.ca_cert = self.tlscacert;
        }
        config.tls.verify |= self.tlsverify;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_positional_output() {
        let cli = Cli::try_parse_from([
            "container-gen",
            "--watch",
            "--notify",
            "nginx -s reload",
            "--notify-sighup",
            "proxy",
            "--only-published",
            "--endpoint",
            "tcp://127.0.0.1:2375",
            "nginx.tmpl",
            "default.conf",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("tcp://127.0.0.1:2375"));
        assert_eq!(config.outputs.len(), 1);
        let output = &config.outputs[0];
        assert_eq!(output.template, PathBuf::from("nginx.tmpl"));
        assert_eq!(output.dest, Some(PathBuf::from("default.conf")));
        assert!(output.watch);
        assert!(output.only_published);
        assert_eq!(output.notify_cmd, "nginx -s reload");
        assert_eq!(output.notify_containers["proxy"], Signal::SIGHUP);
        assert_eq!(output.interval, 0);
    }

    #[test]
    fn test_config_files_and_template_combine() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "endpoint = \"unix:///from/file.sock\"\n[[config]]\ntemplate = \"a.tmpl\"\ndest = \"a.conf\"\ninterval = 10"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let cli = Cli::try_parse_from(["container-gen", "--config", &path, "b.tmpl", "b.conf"])
            .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("unix:///from/file.sock"));
        let templates: Vec<_> = config.outputs.iter().map(|o| o.template.clone()).collect();
        assert_eq!(templates, vec![PathBuf::from("a.tmpl"), PathBuf::from("b.tmpl")]);
        assert_eq!(config.outputs[0].interval, 10);
    }

    #[test]
    fn test_tlsverify_on_unix_socket_starts() {
        let cli = Cli::try_parse_from([
            "container-gen",
            "--tlsverify",
            "--endpoint",
            "unix:///var/run/docker.sock",
            "nginx.tmpl",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();
        assert!(config.tls.verify);
        assert_eq!(config.tls.ca_cert, None);
    }

    #[test]
    fn test_no_outputs_is_an_error() {
        let cli = Cli::try_parse_from(["container-gen"]).unwrap();
        assert!(matches!(cli.into_config(), Err(config::Error::NoOutputs)));
    }
}
