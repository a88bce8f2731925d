use std::panic::Location;

const UNKNOWN: &str = "<UNKNOWN>";

/// Where a log call was issued from.
///
/// Every part is optional: the `info!` family of macros fills all three, the
/// `#[track_caller]` methods on [`Logger`](super::Logger) only know file and
/// line, and a record with no location at all renders as
/// `<UNKNOWN>[<UNKNOWN>:<UNKNOWN>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallSite {
    function: Option<&'static str>,
    file: Option<&'static str>,
    line: Option<u32>,
}

impl CallSite {
    pub const UNKNOWN: CallSite = CallSite {
        function: None,
        file: None,
        line: None,
    };

    pub const fn new(function: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            function: Some(function),
            file: Some(file),
            line: Some(line),
        }
    }

    pub const fn from_parts(
        function: Option<&'static str>,
        file: Option<&'static str>,
        line: Option<u32>,
    ) -> Self {
        Self {
            function,
            file,
            line,
        }
    }

    /// File and line of whoever called the `#[track_caller]` chain that ends here.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            function: None,
            file: Some(location.file()),
            line: Some(location.line()),
        }
    }

    pub fn function(&self) -> Option<&'static str> {
        self.function
    }

    pub fn file(&self) -> Option<&'static str> {
        self.file
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// `function[file.rs:12]` using only the last segment of the function
    /// path and of the file path.
    pub fn short_tag(&self) -> String {
        self.render(
            self.function.map(short_function),
            self.file.map(short_file),
        )
    }

    /// Same shape as [`short_tag`](Self::short_tag) with the full paths kept.
    pub fn long_tag(&self) -> String {
        self.render(self.function, self.file)
    }

    fn render(&self, function: Option<&str>, file: Option<&str>) -> String {
        let line = self
            .line
            .map(|line| line.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());

        format!(
            "{}[{}:{}]",
            function.unwrap_or(UNKNOWN),
            file.unwrap_or(UNKNOWN),
            line
        )
    }
}

fn short_function(name: &str) -> &str {
    let mut name = name;
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }

    name.rsplit("::").next().unwrap_or(name)
}

fn short_file(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tag_keeps_last_segments() {
        let site = CallSite::new("fanlog::server::accept_loop", "src/server/mod.rs", 42);
        assert_eq!(site.short_tag(), "accept_loop[mod.rs:42]");
        assert_eq!(
            site.long_tag(),
            "fanlog::server::accept_loop[src/server/mod.rs:42]"
        );
    }

    #[test]
    fn closures_resolve_to_the_enclosing_function() {
        assert_eq!(short_function("app::run::{{closure}}::{{closure}}"), "run");
        assert_eq!(short_function("main"), "main");
    }

    #[test]
    fn windows_paths_are_shortened() {
        assert_eq!(short_file(r"src\logging\sinks.rs"), "sinks.rs");
        assert_eq!(short_file("sinks.rs"), "sinks.rs");
    }

    #[test]
    fn unknown_site_renders_placeholder() {
        assert_eq!(CallSite::UNKNOWN.short_tag(), "<UNKNOWN>[<UNKNOWN>:<UNKNOWN>]");
        assert_eq!(CallSite::default(), CallSite::UNKNOWN);
    }

    #[test]
    fn caller_records_file_and_line_only() {
        let line = line!() + 1;
        let site = CallSite::caller();
        assert_eq!(site.line(), Some(line));
        assert_eq!(site.function(), None);
        assert_eq!(site.short_tag(), format!("<UNKNOWN>[callsite.rs:{line}]"));
    }

    #[test]
    fn function_name_macro_names_the_enclosing_fn() {
        fn named_here() -> &'static str {
            crate::function_name!()
        }

        assert!(named_here().ends_with("::named_here"), "got {}", named_here());
        let site = CallSite::new(named_here(), file!(), 1);
        assert!(site.short_tag().starts_with("named_here["));
    }
}
