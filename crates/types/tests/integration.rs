//! Integration tests for types

#[cfg(test)]
mod tests {
    use hrel_types::*;
    use proptest::prelude::*;

    #[test]
    fn test_target_serialization() {
        let target = Target::new(TargetOs::Windows, TargetArch::Arm64);
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r#"{"os":"windows","arch":"arm64"}"#);

        let back: Target = serde_json::from_str(&json).unwrap();
        assert_eq!(back, target);
    }

    #[test]
    fn test_target_lists_from_toml() {
        #[derive(serde::Deserialize)]
        struct Matrix {
            oses: Vec<TargetOs>,
            arches: Vec<TargetArch>,
        }

        let matrix: Matrix = toml::from_str(
            r#"
oses = ["linux", "windows"]
arches = ["arm64"]
"#,
        )
        .unwrap();
        let targets = Target::matrix(&matrix.oses, &matrix.arches);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].platform(), "windows/arm64");
    }

    #[test]
    fn test_names_line_up_across_stages() {
        let names = ArtifactNames::new("harbor-cli", "v1.0.0");
        for target in Target::release_matrix() {
            let archive = names.archive(&target);
            assert!(archive.starts_with(&names.stem(&target)));
            assert_eq!(names.sbom(&target), format!("{archive}.sbom.json"));
            if target.os == TargetOs::Windows {
                assert!(names.binary(&target).ends_with(".exe"));
                assert_eq!(ArchiveKind::for_os(target.os), ArchiveKind::Zip);
            } else {
                assert!(archive.ends_with(".tar.gz"));
            }
        }
    }

    #[test]
    fn test_image_tag_serializes_as_string() {
        let tag = ImageTag::normalize("v2.0.0").unwrap();
        assert_eq!(serde_json::to_string(&tag).unwrap(), r#""2.0.0""#);
    }

    proptest! {
        #[test]
        fn normalized_tags_have_no_outer_whitespace(raw in "[ \t]{0,3}v?[0-9a-uw-z.-]{1,12}[ \t\n]{0,3}") {
            let tag = ImageTag::normalize(&raw).unwrap();
            prop_assert_eq!(tag.as_str().trim(), tag.as_str());
            prop_assert!(!tag.as_str().is_empty());
        }

        #[test]
        fn leading_v_is_stripped_once(version in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}") {
            let with_prefix = ImageTag::normalize(&format!("v{version}")).unwrap();
            let without = ImageTag::normalize(&version).unwrap();
            prop_assert_eq!(with_prefix.as_str(), version.as_str());
            prop_assert_eq!(with_prefix, without);
        }

        #[test]
        fn normalize_tags_never_grows(raw in proptest::collection::vec("v?[0-9a-uw-z]{1,6}", 0..8)) {
            let tags = normalize_tags(&raw).unwrap();
            prop_assert!(tags.len() <= raw.len());
            for (i, tag) in tags.iter().enumerate() {
                prop_assert!(!tags[i + 1..].contains(tag));
            }
        }
    }
}
