//! Verb handlers driven end to end against temporary repositories.

mod common;

use std::path::Path;

use common::{bare_remote, git_stdout, init_at, run_git, TestRepo};

use vgl::cli::commands;
use vgl::cli::exit_code;
use vgl::core::context::{ContextFile, ContextStore};
use vgl::core::types::BranchName;
use vgl::engine::Context;

fn b(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn stored(repo: &TestRepo) -> ContextFile {
    ContextStore::for_root(repo.path())
        .read()
        .expect("context file should exist")
        .file
}

fn current_branch(repo: &TestRepo) -> String {
    git_stdout(repo.path(), &["rev-parse", "--abbrev-ref", "HEAD"])
}

mod setup {
    use super::*;

    #[test]
    fn create_makes_a_repository_and_context() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            cwd: Some(dir.path().to_path_buf()),
            interactive: false,
            quiet: true,
            fetch: false,
            ..Context::default()
        };

        commands::create(&ctx, Some(Path::new("proj")), None, None, None, false).unwrap();

        let root = dir.path().join("proj");
        assert!(root.join(".git").is_dir());
        let file = ContextStore::for_root(&root).read().unwrap().file;
        assert_eq!(file.endpoint.local_branch, Some(b("main")));
        let ignore = std::fs::read_to_string(root.join(".gitignore")).unwrap();
        assert!(ignore.lines().any(|l| l == ".vgl"));
    }

    #[test]
    fn create_refuses_an_existing_vgl_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            cwd: Some(dir.path().to_path_buf()),
            interactive: false,
            quiet: true,
            fetch: false,
            ..Context::default()
        };
        commands::create(&ctx, Some(Path::new("proj")), None, None, None, false).unwrap();

        let err = commands::create(&ctx, Some(Path::new("proj")), None, None, None, false)
            .unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn copy_into_clones_the_current_repository() {
        let repo = TestRepo::with_commit();
        let parent = tempfile::TempDir::new().unwrap();
        let dest = parent.path().join("copy");

        commands::copy(&repo.context(), Some(dest.as_path()), None, false).unwrap();

        assert!(dest.join("README.md").is_file());
        let file = ContextStore::for_root(&dest).read().unwrap().file;
        assert_eq!(file.endpoint.local_branch, Some(b("main")));
        assert_eq!(file.endpoint.remote_url, None);
    }

    #[test]
    fn checkout_clones_and_records_the_remote() {
        let (_remote_dir, remote) = bare_remote();
        let seed = TestRepo::with_commit();
        run_git(seed.path(), &["push", "--quiet", remote.to_str().unwrap(), "main"]);

        let parent = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            cwd: Some(parent.path().to_path_buf()),
            interactive: false,
            quiet: true,
            fetch: false,
            ..Context::default()
        };
        commands::checkout(&ctx, remote.to_str().unwrap(), None, None).unwrap();

        let root = parent.path().join("remote");
        assert!(root.join("README.md").is_file());
        let file = ContextStore::for_root(&root).read().unwrap().file;
        assert!(file.endpoint.remote_url.is_some());
        assert_eq!(file.endpoint.local_branch, Some(b("main")));
    }
}

mod files {
    use super::*;

    #[test]
    fn track_then_commit() {
        let repo = TestRepo::with_commit();
        repo.write("new.txt", "new\n");
        let ctx = repo.context();

        commands::track(&ctx, &strings(&["new.txt"]), false).unwrap();
        assert!(repo.ls_files().contains(&"new.txt".to_string()));
        let file = stored(&repo);
        assert!(file.tracked.iter().any(|p| p.as_str() == "new.txt"));
        assert!(file.undecided.iter().all(|p| p.as_str() != "new.txt"));

        let before = repo.head();
        commands::commit(&ctx, "add new", false).unwrap();
        assert_ne!(repo.head(), before);
        assert_eq!(
            git_stdout(repo.path(), &["log", "-1", "--format=%s"]),
            "add new"
        );
        assert!(!repo.ls_files().contains(&".gitignore".to_string()));
    }

    #[test]
    fn commit_stages_tracked_modifications() {
        let repo = TestRepo::with_commit();
        repo.write("README.md", "# Edited\n");
        let ctx = repo.context();

        commands::commit(&ctx, "edit readme", false).unwrap();

        assert_eq!(
            git_stdout(repo.path(), &["show", "HEAD:README.md"]),
            "# Edited"
        );
    }

    #[test]
    fn commit_with_nothing_staged_is_a_user_error() {
        let repo = TestRepo::with_commit();
        let err = commands::commit(&repo.context(), "empty", false).unwrap_err();
        assert_eq!(exit_code(&err), 1);
        assert!(err.to_string().contains("nothing to commit"));
    }

    #[test]
    fn commit_requires_a_message() {
        let repo = TestRepo::with_commit();
        let err = commands::commit(&repo.context(), "  ", false).unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn track_all_takes_every_undecided_file() {
        let repo = TestRepo::with_commit();
        repo.write("a.txt", "a\n");
        repo.write("dir/b.txt", "b\n");

        commands::track(&repo.context(), &[], true).unwrap();

        let files = repo.ls_files();
        assert!(files.contains(&"a.txt".to_string()));
        assert!(files.contains(&"dir/b.txt".to_string()));
        assert!(stored(&repo).undecided.is_empty());
    }

    #[test]
    fn track_glob_matches_below_directories() {
        let repo = TestRepo::with_commit();
        repo.write("src/one.rs", "1\n");
        repo.write("src/deep/two.rs", "2\n");
        repo.write("notes.md", "n\n");

        commands::track(&repo.context(), &strings(&["*.rs"]), false).unwrap();

        let files = repo.ls_files();
        assert!(files.contains(&"src/one.rs".to_string()));
        assert!(files.contains(&"src/deep/two.rs".to_string()));
        assert!(!files.contains(&"notes.md".to_string()));
    }

    #[test]
    fn untrack_removes_from_the_index_and_keeps_the_file() {
        let repo = TestRepo::with_commit();
        repo.commit_file("secret.env", "KEY=1\n", "oops");

        commands::untrack(&repo.context(), &strings(&["secret.env"]), false).unwrap();

        assert!(!repo.ls_files().contains(&"secret.env".to_string()));
        assert!(repo.path().join("secret.env").is_file());
        assert!(stored(&repo)
            .untracked
            .iter()
            .any(|p| p.as_str() == "secret.env"));
    }

    #[test]
    fn tracking_inside_a_nested_repository_is_refused() {
        let repo = TestRepo::with_commit();
        let nested = repo.path().join("lib");
        init_at(&nested);
        std::fs::write(nested.join("inner.txt"), "inner\n").unwrap();

        let err = commands::track(&repo.context(), &strings(&["lib/inner.txt"]), false)
            .unwrap_err();
        assert_eq!(exit_code(&err), 1);
        assert!(err.to_string().contains("nested repository"));
        assert!(!repo.ls_files().iter().any(|f| f.starts_with("lib")));
    }

    #[test]
    fn globs_aimed_into_a_nested_repository_are_refused() {
        let repo = TestRepo::with_commit();
        let nested = repo.path().join("lib");
        init_at(&nested);
        std::fs::write(nested.join("inner.txt"), "inner\n").unwrap();

        for verb in ["track", "untrack", "restore"] {
            let patterns = strings(&["lib/*"]);
            let err = match verb {
                "track" => commands::track(&repo.context(), &patterns, false),
                "untrack" => commands::untrack(&repo.context(), &patterns, false),
                _ => commands::restore(&repo.context(), &patterns, "HEAD", true),
            }
            .unwrap_err();
            assert_eq!(exit_code(&err), 1, "{verb}");
            assert!(err.to_string().contains("nested repository"), "{verb}: {err}");
        }
        assert!(!repo.ls_files().iter().any(|f| f.starts_with("lib")));
    }

    #[test]
    fn paths_outside_the_repository_are_refused() {
        let repo = TestRepo::with_commit();
        let err = commands::track(&repo.context(), &strings(&["../elsewhere.txt"]), false)
            .unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn forced_restore_discards_changes() {
        let repo = TestRepo::with_commit();
        repo.write("README.md", "scribbles\n");

        commands::restore(&repo.context(), &strings(&["README.md"]), "HEAD", true).unwrap();

        assert_eq!(
            std::fs::read_to_string(repo.path().join("README.md")).unwrap(),
            "# Test Repo\n"
        );
    }

    #[test]
    fn restore_without_a_prompt_needs_force() {
        let repo = TestRepo::with_commit();
        repo.write("README.md", "scribbles\n");

        let err = commands::restore(&repo.context(), &[], "HEAD", false).unwrap_err();
        assert_eq!(exit_code(&err), 1);
        assert!(err.to_string().contains("--force"));
        assert_eq!(
            std::fs::read_to_string(repo.path().join("README.md")).unwrap(),
            "scribbles\n"
        );
    }

    #[test]
    fn status_and_diff_run_read_only() {
        let repo = TestRepo::with_commit();
        repo.write("README.md", "# Changed\n");
        let ctx = repo.context();

        commands::status(
            &ctx,
            commands::StatusOptions {
                no_fetch: true,
                ..Default::default()
            },
        )
        .unwrap();
        commands::diff(&ctx, &[]).unwrap();
    }
}

mod branches {
    use super::*;

    #[test]
    fn split_and_jump_back() {
        let repo = TestRepo::with_commit();
        let ctx = repo.context();

        commands::split(&ctx, &b("feature"), None, false).unwrap();
        assert_eq!(current_branch(&repo), "feature");
        let file = stored(&repo);
        assert_eq!(file.endpoint.local_branch, Some(b("feature")));
        assert_eq!(
            file.jump.as_ref().and_then(|j| j.local_branch.clone()),
            Some(b("main"))
        );

        commands::jump(&ctx).unwrap();
        assert_eq!(current_branch(&repo), "main");
        let file = stored(&repo);
        assert_eq!(file.endpoint.local_branch, Some(b("main")));
        assert_eq!(
            file.jump.as_ref().and_then(|j| j.local_branch.clone()),
            Some(b("feature"))
        );
    }

    #[test]
    fn jump_without_history_is_a_user_error() {
        let repo = TestRepo::with_commit();
        let err = commands::jump(&repo.context()).unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn switch_to_a_missing_branch_is_refused() {
        let repo = TestRepo::with_commit();
        let err = commands::switch(
            &repo.context(),
            commands::SwitchTarget {
                branch: Some(b("nope")),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(exit_code(&err), 1);
        assert_eq!(current_branch(&repo), "main");
    }

    #[test]
    fn merge_brings_in_another_branch() {
        let repo = TestRepo::with_commit();
        let ctx = repo.context();

        commands::split(&ctx, &b("topic"), None, false).unwrap();
        repo.commit_file("topic.txt", "topic\n", "topic work");
        commands::switch(
            &ctx,
            commands::SwitchTarget {
                branch: Some(b("main")),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!repo.path().join("topic.txt").exists());

        commands::merge(&ctx, Some(&b("topic")), None).unwrap();
        assert!(repo.path().join("topic.txt").is_file());
    }

    #[test]
    fn delete_removes_a_branch_and_its_jump() {
        let repo = TestRepo::with_commit();
        let ctx = repo.context();

        commands::split(&ctx, &b("old"), None, false).unwrap();
        commands::jump(&ctx).unwrap();
        commands::delete(&ctx, Some(&b("old")), None, true).unwrap();

        let branches = git_stdout(repo.path(), &["branch", "--format=%(refname:short)"]);
        assert!(!branches.lines().any(|l| l == "old"));
        assert!(stored(&repo).jump.is_none());
    }

    #[test]
    fn deleting_the_current_branch_is_refused() {
        let repo = TestRepo::with_commit();
        let err = commands::delete(&repo.context(), Some(&b("main")), None, true).unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn abort_backs_out_of_a_conflicted_merge() {
        let repo = TestRepo::with_commit();
        run_git(repo.path(), &["checkout", "--quiet", "-b", "other"]);
        repo.commit_file("README.md", "# Theirs\n", "theirs");
        run_git(repo.path(), &["checkout", "--quiet", "main"]);
        repo.commit_file("README.md", "# Ours\n", "ours");
        let before = repo.head();

        let merged = std::process::Command::new("git")
            .args(["merge", "--no-edit", "other"])
            .current_dir(repo.path())
            .output()
            .unwrap();
        assert!(!merged.status.success());
        assert!(repo.git().merge_in_progress());

        commands::abort(&repo.context()).unwrap();

        assert!(!repo.git().merge_in_progress());
        assert_eq!(repo.head(), before);
        assert_eq!(
            std::fs::read_to_string(repo.path().join("README.md")).unwrap(),
            "# Ours\n"
        );
    }

    #[test]
    fn abort_without_a_merge_is_fine() {
        let repo = TestRepo::with_commit();
        commands::abort(&repo.context()).unwrap();
        assert!(!repo.git().merge_in_progress());
    }
}

mod remote {
    use super::*;

    fn with_remote(repo: &TestRepo, url: &str) {
        commands::switch(
            &repo.context(),
            commands::SwitchTarget {
                remote_url: Some(url.to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn push_publishes_the_branch() {
        let repo = TestRepo::with_commit();
        let (_remote_dir, remote) = bare_remote();
        with_remote(&repo, remote.to_str().unwrap());

        commands::push(&repo.context(), false).unwrap();

        assert_eq!(git_stdout(&remote, &["rev-parse", "main"]), repo.head());
        assert_eq!(
            stored(&repo).endpoint.remote_url.as_deref(),
            remote.to_str()
        );
    }

    #[test]
    fn push_without_a_remote_is_a_user_error() {
        let repo = TestRepo::with_commit();
        let err = commands::push(&repo.context(), false).unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn sync_pulls_then_pushes() {
        let repo = TestRepo::with_commit();
        let (_remote_dir, remote) = bare_remote();
        with_remote(&repo, remote.to_str().unwrap());
        commands::push(&repo.context(), false).unwrap();

        let other = tempfile::TempDir::new().unwrap();
        run_git(
            other.path(),
            &["clone", "--quiet", remote.to_str().unwrap(), "work"],
        );
        let work = other.path().join("work");
        run_git(&work, &["config", "user.email", "other@example.com"]);
        run_git(&work, &["config", "user.name", "Other User"]);
        std::fs::write(work.join("theirs.txt"), "theirs\n").unwrap();
        run_git(&work, &["add", "theirs.txt"]);
        run_git(&work, &["commit", "--quiet", "-m", "theirs"]);
        run_git(&work, &["push", "--quiet", "origin", "main"]);

        commands::sync(&repo.context(), false).unwrap();

        assert!(repo.path().join("theirs.txt").is_file());
        assert_eq!(git_stdout(&remote, &["rev-parse", "main"]), repo.head());
    }

    #[test]
    fn pull_refuses_pending_changes() {
        let repo = TestRepo::with_commit();
        let (_remote_dir, remote) = bare_remote();
        with_remote(&repo, remote.to_str().unwrap());
        commands::push(&repo.context(), false).unwrap();
        repo.write("README.md", "# Local edit\n");

        let err = commands::pull(&repo.context(), false, false).unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }
}
