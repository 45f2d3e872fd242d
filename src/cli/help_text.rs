pub(super) const ROOT_LONG_ABOUT: &str = "\
Browse directory trees annotated with file statuses

fsdb lists a directory tree the way a version control front end sees it: every
file and directory carries a status tag such as M (modified) or ? (untracked).
Directories are only read when the listing reaches them.

STATUS REPORTS:

  A report is plain text, one entry per line: a status code, a space, and a
  path relative to the tree root. A path ending in / gives a directory's own
  status. A line indented by two spaces names the copy source of the A line
  above it; if that source is reported R, the pair is a move.

    M src/lib.rs
    A src/new.rs
      src/old.rs
    R src/old.rs
    ? notes/

  Codes: M modified, A added, R removed, C clean, ! missing, ? untracked,
  I ignored.

POLICIES:

  A policy file (--policy FILE) is TOML and decides which tags are ignored,
  clean or significant, the status of files absent from the report, and how
  directory statuses are derived. Omitted keys keep their defaults:

    hidden_marker = \".\"
    on_disk_default = \"?\"
    ignored = [\"I\"]
    clean = [\"C\"]
    significant = [\"M\", \"A\", \"R\", \"!\"]

    [aggregate]
    precedence = [\"M\", \"A\", \"R\", \"!\", \"?\"]
    default = \"C\"

  Without a policy, ls shows no statuses and status/changes use the defaults
  above.

OUTPUT:

  One line per entry: the status code, then the name indented by depth.
  Directories end in / and come before files.

EXIT CODES:

  0    Success
  255  Error (unreadable report or policy, PATH not in the tree, ...)

LOGGING:

  Logs go to stderr. Use -v for info, -vv for debug, or set RUST_LOG.
";

pub(super) const LS_LONG_ABOUT: &str = "\
List the filesystem tree

Lists PATH (default: the tree root) straight from disk. With --policy, every
entry gets the policy's on-disk status and the policy's filters apply.

Hidden entries (names starting with the policy's hidden marker) are only shown
with --all.
";

pub(super) const STATUS_LONG_ABOUT: &str = "\
List the filesystem tree with statuses from a report

Reads the status report given by --report and overlays it on the tree. Files
named in the report take the reported status, other files the policy's on-disk
status. Paths only found in the report, such as removed files, are listed as
well, including directories that no longer exist.

A directory's status is the one reported for it, or else derived from the
statuses reported below it.

Examples:
  $ hg status -A > status.txt && fsdb status --report status.txt
  $ hg status -A | fsdb status --report - -r --hide-clean
";

pub(super) const CHANGES_LONG_ABOUT: &str = "\
List only the paths named in a report

Builds the tree from the status report given by --report alone. The
filesystem is never read, so this works for changes that are not on disk,
e.g. the files touched by a patch.
";
