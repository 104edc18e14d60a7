/// How a link is materialized on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Symbolic,
    Hard,
}

/// Platform-dependent link behavior, resolved once at startup instead of
/// scattered conditionals: the kind of link to create and the separator used
/// between algorithm and hash in blob file names (filesystems that cannot
/// address colons store blobs with `-`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformPolicy {
    pub link_kind: LinkKind,
    pub digest_separator: char,
}

impl PlatformPolicy {
    pub const fn new(link_kind: LinkKind, digest_separator: char) -> Self {
        Self {
            link_kind,
            digest_separator,
        }
    }

    /// Policy for the platform this binary was built for. Symbolic links
    /// require elevated privileges on Windows, so hard links are used there.
    pub const fn native() -> Self {
        #[cfg(windows)]
        {
            Self::new(LinkKind::Hard, '-')
        }
        #[cfg(not(windows))]
        {
            Self::new(LinkKind::Symbolic, ':')
        }
    }
}
