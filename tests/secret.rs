#[cfg(test)]
mod tests {
    use std::fs;
    use taskvault::libs::secret::Secret;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct SecretTestContext {
        _temp_dir: TempDir,
        secret: Secret,
    }

    impl TestContext for SecretTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let secret = Secret::at(temp_dir.path().join(".secret"), "Password");
            SecretTestContext {
                _temp_dir: temp_dir,
                secret,
            }
        }
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_store_and_read(ctx: &mut SecretTestContext) {
        ctx.secret.store("correct horse").unwrap();
        assert_eq!(ctx.secret.read().unwrap(), "correct horse");
        assert_eq!(ctx.secret.get_or_prompt().unwrap(), "correct horse");
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_file_is_not_plaintext(ctx: &mut SecretTestContext) {
        ctx.secret.store("correct horse").unwrap();
        let on_disk = fs::read_to_string(ctx.secret.path()).unwrap();
        assert!(!on_disk.contains("correct horse"));
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_clear(ctx: &mut SecretTestContext) {
        ctx.secret.store("pw").unwrap();
        ctx.secret.clear().unwrap();
        assert!(!ctx.secret.path().exists());
        assert!(ctx.secret.read().is_err());
        // Clearing twice is fine
        ctx.secret.clear().unwrap();
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_garbage_cache_fails_to_read(ctx: &mut SecretTestContext) {
        fs::write(ctx.secret.path(), "not base64 !!").unwrap();
        assert!(ctx.secret.read().is_err());
    }
}
