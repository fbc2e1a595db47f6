use dupfind::Error;
use dupfind::utils::{
    build_exclude_matcher, expand_exclude_patterns, is_pseudo_filesystem, matches_blacklist,
};
use std::path::Path;

#[test]
fn test_expand_exclude_patterns() {
    let patterns = vec![
        "node_modules".to_string(),
        "*.log".to_string(),
        "build/".to_string(),
        "  ".to_string(),
    ];
    let expanded = expand_exclude_patterns(&patterns);

    assert_eq!(
        expanded,
        vec![
            "**/node_modules".to_string(),
            "**/node_modules/**".to_string(),
            "*.log".to_string(),
            "build/".to_string(),
        ]
    );
}

#[test]
fn test_build_exclude_matcher() {
    let patterns = expand_exclude_patterns(&["target".to_string(), ".git".to_string()]);
    let matcher = build_exclude_matcher(&patterns).unwrap();

    assert!(matcher.is_match("project/target"));
    assert!(matcher.is_match("project/target/debug"));
    assert!(matcher.is_match(".git"));
    assert!(!matcher.is_match("project/src"));
}

#[test]
fn test_build_exclude_matcher_rejects_invalid_glob() {
    let result = build_exclude_matcher(&["a[".to_string()]);
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn test_matches_blacklist() {
    let blacklist = vec!["cache".to_string(), String::new()];

    assert!(matches_blacklist(Path::new("/home/user/.cache/app"), &blacklist));
    assert!(matches_blacklist(Path::new("/var/cache"), &blacklist));
    assert!(!matches_blacklist(Path::new("/home/user/docs"), &blacklist));
    assert!(!matches_blacklist(Path::new("/anything"), &[]));
}

#[test]
fn test_is_pseudo_filesystem() {
    assert!(is_pseudo_filesystem(Path::new("/proc")));
    assert!(is_pseudo_filesystem(Path::new("/sys")));
    assert!(!is_pseudo_filesystem(Path::new("/proc/self")));
    assert!(!is_pseudo_filesystem(Path::new("/home")));
}
