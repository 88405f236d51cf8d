use bitflags::bitflags;

bitflags! {
    /// Options accepted by [`glob`](crate::glob) and the pattern compiler.
    ///
    /// Bit values follow the glibc `GLOB_*` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GlobFlags: u32 {
        /// Abort the walk when a directory cannot be read.
        const ERR      = 1 << 0;
        /// Append `/` to every matched directory.
        const MARK     = 1 << 1;
        /// Return matches in walk order instead of sorting them.
        const NOSORT   = 1 << 2;
        /// Return the pattern itself when nothing matched.
        const NOCHECK  = 1 << 4;
        /// Treat `\` as a literal character.
        const NOESCAPE = 1 << 6;
        /// Expand `{a,b,c}` alternation groups.
        const BRACE    = 1 << 10;
        /// Only return directories.
        const ONLYDIR  = 1 << 13;
    }
}
