//! Shared fixture workspaces for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const FEATURE: &str = r#"import { defineFeature } from '@contracts/lib';

export const BillingFeature = defineFeature({
  meta: { key: 'billing', title: 'Billing' },
  operations: [
    { key: 'billing.charge', version: '1' },
    { key: 'billing.refund', version: '1' },
  ],
  events: [{ key: 'billing.charged', version: '1' }],
  presentations: [{ key: 'billing.form', version: '1' }],
  capabilities: {
    provides: [{ key: 'payments', version: '1' }],
  },
  opToPresentation: [
    { op: { key: 'billing.charge', version: '1' }, pres: { key: 'billing.form', version: '1' } },
  ],
});
"#;

pub const CHARGE: &str = r#"import { defineCommand } from '@contracts/lib';

export const BillingChargeSpec = defineCommand({
  meta: { key: 'billing.charge', version: '1', stability: 'stable' },
  implementations: [
    { path: 'src/handlers/billing-charge.handler.ts', type: 'handler' },
  ],
});
"#;

pub const CHARGED: &str = "export const Charged = defineEvent({ meta: { key: 'billing.charged', version: '1' } });\n";

pub const FORM: &str =
    "export const Form = definePresentation({ meta: { key: 'billing.form', version: '1' } });\n";

pub const LEGACY: &str =
    "export const Legacy = defineCommand({ meta: { key: 'billing.legacy', version: '1' } });\n";

pub const CHARGE_TEST: &str = r#"export const ChargeTest = defineTestSpec({
  meta: { key: 'billing.charge.suite', version: '1' },
  target: { type: 'operation', operation: { key: 'billing.charge', version: '1' } },
});
"#;

pub const HANDLER: &str = r#"import { BillingChargeSpec } from '../../contracts/billing.command';

export const handler = implement(BillingChargeSpec, async () => ({ ok: true }));
"#;

/// Temporary workspace populated with contract documents.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Billing feature with one unresolved operation, one missing provided
    /// capability, and one orphaned operation.
    pub fn billing() -> Self {
        let ws = Self::empty();
        ws.write("contracts/billing.feature.ts", FEATURE);
        ws.write("contracts/billing.command.ts", CHARGE);
        ws.write("contracts/billing.event.ts", CHARGED);
        ws.write("contracts/billing.presentation.ts", FORM);
        ws.write("contracts/legacy.command.ts", LEGACY);
        ws.write("contracts/billing-charge.test-spec.ts", CHARGE_TEST);
        ws.write("src/handlers/billing-charge.handler.ts", HANDLER);
        ws.write("src/handlers/billing-charge.handler.test.ts", "test('charges', () => {});\n");
        ws.write("node_modules/vendor/shadow.command.ts", LEGACY);
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    /// Run `ctint <args> --root <workspace>`.
    #[allow(dead_code)]
    pub fn ctint(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ctint"))
            .args(args)
            .arg("--root")
            .arg(self.root())
            .env_remove("RUST_LOG")
            .output()
            .expect("run ctint")
    }
}
