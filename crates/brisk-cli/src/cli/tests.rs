#[cfg(test)]
mod tests {
    use crate::cli::validation::parse_port;
    use crate::cli::{Cli, Command, StylesheetMode};
    use brisk_bundler::StylesheetHandling;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8080"), Ok(8080));
        assert_eq!(parse_port("1"), Ok(1));
        assert!(parse_port("0").is_err());
        assert!(parse_port("65536").is_err());
        assert!(parse_port("http").is_err());
    }

    #[test]
    fn test_dev_defaults_leave_config_untouched() {
        let cli = Cli::try_parse_from(["brisk", "dev"]).unwrap();
        match cli.command {
            Command::Dev(args) => {
                assert!(args.source_root.is_none());
                assert!(args.destination.is_none());
                assert!(args.port.is_none());
                assert!(!args.no_watch);
                assert!(!args.open);
            }
            _ => panic!("expected dev command"),
        }
    }

    #[test]
    fn test_dev_all_flags() {
        let cli = Cli::try_parse_from([
            "brisk",
            "dev",
            "--source-root",
            "app",
            "--destination",
            "memory",
            "--port",
            "3000",
            "--host",
            "0.0.0.0",
            "--no-watch",
            "--minify",
            "--no-sourcemap",
            "--stylesheets",
            "inline-as-text",
            "--recursive",
            "--open",
        ])
        .unwrap();

        let Command::Dev(args) = cli.command else {
            panic!("expected dev command");
        };
        assert_eq!(args.source_root, Some(PathBuf::from("app")));
        assert_eq!(args.destination.as_deref(), Some("memory"));
        assert_eq!(args.port, Some(3000));
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert!(args.no_watch && args.minify && args.no_sourcemap && args.recursive && args.open);
        assert_eq!(args.stylesheets, Some(StylesheetMode::InlineAsText));
    }

    #[test]
    fn test_dev_rejects_port_zero() {
        assert!(Cli::try_parse_from(["brisk", "dev", "--port", "0"]).is_err());
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::try_parse_from([
            "brisk",
            "build",
            "-d",
            "out",
            "--no-minify",
            "--sourcemap",
            "--stylesheets",
            "emit-css",
        ])
        .unwrap();

        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.destination.as_deref(), Some("out"));
        assert!(args.no_minify);
        assert!(args.sourcemap);
        assert_eq!(args.stylesheets, Some(StylesheetMode::EmitCss));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["brisk", "-v", "-q", "build"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["brisk", "build", "--verbose", "--no-color"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
    }

    #[test]
    fn test_stylesheet_mode_conversion() {
        assert_eq!(
            StylesheetHandling::from(StylesheetMode::InlineAsText),
            StylesheetHandling::InlineAsText
        );
        assert_eq!(
            StylesheetHandling::from(StylesheetMode::EmitCss),
            StylesheetHandling::EmitCss
        );
    }

    #[test]
    fn test_unknown_stylesheet_mode_rejected() {
        assert!(Cli::try_parse_from(["brisk", "dev", "--stylesheets", "sass"]).is_err());
    }
}
