// Static scan of every Rust source file for tracing calls that carry patient
// data. Logs identify records by opaque ids only.
