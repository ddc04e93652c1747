use vrlens::mesh::LensMesh;
use vrlens::read::{LensReader, ReadError};
use vrlens::write::{LensWriter, LensWriterSettings};
use vrlens::{Revision, decode, detect, detect_revision, encode};

fn triangle() -> LensMesh {
    LensMesh {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        indices: vec![0, 1, 2],
    }
}

fn quad(offset: f32) -> LensMesh {
    LensMesh {
        positions: vec![
            [offset, 0.0, -1.0],
            [offset + 1.0, 0.0, -1.0],
            [offset + 1.0, 1.0, -1.0],
            [offset, 1.0, -1.0],
        ],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

#[test]
fn single_triangle_revision_a() -> anyhow::Result<()> {
    let mesh = triangle();
    let bytes = encode(std::slice::from_ref(&mesh), Revision::A)?;
    assert_eq!(bytes.len(), 88);
    assert!(detect(&bytes, Revision::A));
    assert!(!detect(&bytes, Revision::B));

    let decoded = decode(&bytes, Revision::A)?;
    assert_eq!(decoded.meshes.len(), 1);
    assert_eq!(decoded.meshes[0], mesh);
    Ok(())
}

#[test]
fn single_mesh_revision_b() -> anyhow::Result<()> {
    let mesh = quad(0.5);
    let bytes = encode(std::slice::from_ref(&mesh), Revision::B)?;
    assert_eq!(bytes.len(), 16 + 4 * 24 + 6 * 4);
    assert_eq!(detect_revision(&bytes), Some(Revision::B));

    let decoded = decode(&bytes, Revision::B)?.into_single().unwrap();
    assert_eq!(decoded, mesh);
    Ok(())
}

#[test]
fn multi_mesh_collapse_revision_a() -> anyhow::Result<()> {
    let meshes = vec![triangle(), quad(2.0), quad(-3.0)];
    let bytes = encode(&meshes, Revision::A)?;

    let n_vertices: usize = meshes.iter().map(|m| m.n_vertices()).sum();
    let n_indices: usize = meshes.iter().map(|m| m.n_indices()).sum();
    assert_eq!(bytes.len(), 16 + n_vertices * 20 + n_indices * 4);

    let flat = decode(&bytes, Revision::A)?.into_single().unwrap();
    assert_eq!(flat.n_vertices(), n_vertices);
    assert_eq!(flat.n_indices(), n_indices);

    let expected_positions: Vec<_> = meshes
        .iter()
        .flat_map(|m| m.indexed_positions())
        .collect();
    let actual_positions: Vec<_> = flat.indexed_positions().collect();
    assert_eq!(actual_positions, expected_positions);
    assert!(actual_positions.iter().all(|p| p.is_some()));

    let expected_uvs: Vec<_> = meshes.iter().flat_map(|m| m.uvs.iter().copied()).collect();
    assert_eq!(flat.uvs, expected_uvs);
    Ok(())
}

#[test]
fn two_meshes_renumber_to_contiguous_indices() -> anyhow::Result<()> {
    let a = LensMesh {
        positions: vec![[0.0; 3]; 3],
        uvs: vec![[0.0; 2]; 3],
        indices: vec![0, 1, 2],
    };
    let b = LensMesh {
        positions: vec![[1.0; 3]; 2],
        uvs: vec![[1.0; 2]; 2],
        indices: vec![0, 1],
    };
    let flat = decode(&encode(&[a, b], Revision::A)?, Revision::A)?
        .into_single()
        .unwrap();
    assert_eq!(flat.indices, vec![0, 1, 2, 3, 4]);
    Ok(())
}

#[test]
fn empty_mesh_round_trip() -> anyhow::Result<()> {
    for rev in Revision::ALL {
        let bytes = encode(&[LensMesh::default()], rev)?;
        assert_eq!(bytes.len(), 16);
        let decoded = decode(&bytes, rev)?;
        assert_eq!(decoded.meshes, vec![LensMesh::default()]);
    }
    Ok(())
}

#[test]
fn revision_b_discards_extra_meshes() -> anyhow::Result<()> {
    let meshes = [triangle(), quad(1.0)];
    let bytes = encode(&meshes, Revision::B)?;
    let decoded = decode(&bytes, Revision::B)?.into_single().unwrap();
    assert_eq!(decoded, meshes[0]);
    Ok(())
}

#[test]
fn revisions_are_not_interchangeable() -> anyhow::Result<()> {
    let bytes = encode(&[triangle()], Revision::A)?;
    assert!(matches!(
        decode(&bytes, Revision::B),
        Err(ReadError::NotThisFormat)
    ));
    Ok(())
}

#[test]
fn truncating_any_byte_is_reported() -> anyhow::Result<()> {
    let bytes = encode(&[quad(0.0)], Revision::A)?;
    for len in 8..bytes.len() {
        assert!(
            matches!(
                decode(&bytes[..len], Revision::A),
                Err(ReadError::TruncatedData { .. })
            ),
            "length {} should be truncated",
            len,
        );
    }
    for len in 0..8 {
        assert!(matches!(
            decode(&bytes[..len], Revision::A),
            Err(ReadError::NotThisFormat)
        ));
    }
    Ok(())
}

#[test]
fn reader_and_writer_agree_across_revisions() -> anyhow::Result<()> {
    let src = quad(4.0);
    for rev in Revision::ALL {
        let writer = LensWriter::new_with_settings(LensWriterSettings {
            revision: rev,
            ..Default::default()
        })
        .with_mesh(src.as_mesh_ref())?;
        let bytes = writer.encode()?;
        assert_eq!(bytes.len(), writer.encoded_len()?);

        let reader = LensReader::init(&bytes)?;
        assert_eq!(reader.revision(), rev);
        assert_eq!(reader.expected_len(), Some(bytes.len()));
        let buffers = reader.into_flat_buffers()?;
        assert_eq!(buffers.vertices.len(), 4 * rev.stride());
        assert_eq!(buffers.indices.len(), 6 * 4);
        assert!(buffers.trailing.is_empty());
        assert_eq!(reader.decode()?.into_single(), Some(src.clone()));
    }
    Ok(())
}
