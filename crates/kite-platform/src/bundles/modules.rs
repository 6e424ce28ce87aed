//! Embedded module tables and source maps for the capability bundles.
//!
//! The tables are fixed at build time; each capability compiles into one
//! bundle against the platform's VM. Source maps are shipped alongside so a
//! connected debugger can resolve frames inside bundle code.

use kite_engine::BundleModule;

/// Modules compiled into the `runtime` bundle at platform init.
pub static RUNTIME_MODULES: &[BundleModule] = &[
    BundleModule {
        name: "kite/entrypoint",
        source: r#"const engine = globalThis.$kite;
engine.dispatcher = require('kite/message-dispatcher');
engine.console = require('kite/console');
"#,
    },
    BundleModule {
        name: "kite/message-dispatcher",
        source: r#"class MessageDispatcher {
  constructor() { this.pending = []; this.handlers = new Map(); }
  dispatch(message) {
    const handler = this.handlers.get(message.type);
    if (handler === undefined) { this.pending.push(message); return; }
    handler(message.payload);
  }
  subscribe(type, handler) { this.handlers.set(type, handler); }
}
module.exports = new MessageDispatcher();
"#,
    },
    BundleModule {
        name: "kite/console",
        source: r#"module.exports = {
  log(...args) { globalThis.$kite.emit('console', { level: 'info', args }); },
  warn(...args) { globalThis.$kite.emit('console', { level: 'warning', args }); },
  error(...args) { globalThis.$kite.emit('console', { level: 'error', args }); },
};
"#,
    },
];

/// Source map for the `runtime` bundle.
pub static RUNTIME_SOURCE_MAP: &str = r#"{"version":3,"sources":["kite/entrypoint","kite/message-dispatcher","kite/console"],"names":[],"mappings":"AAAA"}"#;

/// Modules compiled into the `debug` bundle at platform init.
pub static DEBUG_MODULES: &[BundleModule] = &[
    BundleModule {
        name: "kite/debug-transport",
        source: r#"module.exports = {
  send(packet) { globalThis.$kite.emit('debug', packet); },
  onPacket(handler) { globalThis.$kite.dispatcher.subscribe('debug', handler); },
};
"#,
    },
];

/// Modules compiled into the `objc` bundle on first request.
pub static OBJC_MODULES: &[BundleModule] = &[
    BundleModule {
        name: "kite/objc",
        source: r#"const api = globalThis.$kiteObjC;
module.exports = {
  available: api !== undefined,
  classes: api !== undefined ? api.enumerateClasses() : {},
};
"#,
    },
];

/// Source map for the `objc` bundle.
pub static OBJC_SOURCE_MAP: &str = r#"{"version":3,"sources":["kite/objc"],"names":[],"mappings":"AAAA"}"#;

/// Modules compiled into the `java` bundle on first request.
pub static JAVA_MODULES: &[BundleModule] = &[
    BundleModule {
        name: "kite/java",
        source: r#"const api = globalThis.$kiteJava;
module.exports = {
  available: api !== undefined,
  vm: api !== undefined ? api.attachCurrentThread() : null,
};
"#,
    },
];

/// Source map for the `java` bundle.
pub static JAVA_SOURCE_MAP: &str = r#"{"version":3,"sources":["kite/java"],"names":[],"mappings":"AAAA"}"#;
