use image::{ImageBuffer, Rgba, RgbaImage};
use lsb_spa::{
    PixelGrid,
    cli::{AnalyzeArgs, HideArgs, ModeArgs, ModeKind, RecoverArgs, SanitizeArgs, SweepArgs},
    handler::{handle_analyze, handle_hide, handle_recover, handle_sanitize, handle_sweep},
};
use rand::RngCore;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// 一个辅助函数，用于创建一个带有随机像素的测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut img_buf = ImageBuffer::new(width, height);
    let mut raw_pixels = vec![0u8; (width * height * 4) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    img_buf
        .pixels_mut()
        .zip(raw_pixels.chunks_exact(4))
        .for_each(|(pixel, chunk)| {
            *pixel = Rgba([chunk[0], chunk[1], chunk[2], 255]);
        });

    img_buf.save(path).expect("Failed to create test image.");
}

fn terminator_mode() -> ModeArgs {
    ModeArgs {
        mode: ModeKind::Terminator,
        ..Default::default()
    }
}

/// 验证从隐藏到恢复的完整流程
#[test]
fn test_handle_hide_and_recover_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");
    let hidden_image_path = dir.path().join("hidden.png");
    let source_text_path = dir.path().join("source.txt");
    let recovered_text_path = dir.path().join("recovered.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "This is a test message for the handler! 这是一个给处理器的测试信息！";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_hide
    handle_hide(HideArgs {
        image: original_image_path.clone(),
        text: source_text_path.clone(),
        dest: Some(hidden_image_path.clone()),
        force: false,
        mode: ModeArgs::default(),
    })?;
    assert!(hidden_image_path.exists(), "Hidden image should be created.");

    // 3. 测试 handle_recover
    handle_recover(RecoverArgs {
        image: hidden_image_path.clone(),
        text: Some(recovered_text_path.clone()),
        force: false,
        mode: ModeArgs::default(),
    })?;

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&recovered_text_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text must match the original."
    );

    // 5. 只有最低有效位发生变化，alpha 通道保持不变
    let before = image::open(&original_image_path)?.to_rgba8();
    let after = image::open(&hidden_image_path)?.to_rgba8();
    for (old, new) in before.pixels().zip(after.pixels()) {
        for channel in 0..3 {
            assert!(old[channel].abs_diff(new[channel]) <= 1);
        }
        assert_eq!(old[3], new[3]);
    }

    Ok(())
}

/// 验证终止符模式下的隐藏与恢复
#[test]
fn test_handle_hide_and_recover_with_terminator() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("cover.png");
    let text_path = dir.path().join("message.txt");
    let dest_path = dir.path().join("stego.png");
    let recovered_path = dir.path().join("out.txt");

    create_test_image(&image_path, 40, 40);
    fs::write(&text_path, "hidden behind a terminator")?;

    handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(dest_path.clone()),
        force: false,
        mode: terminator_mode(),
    })?;
    handle_recover(RecoverArgs {
        image: dest_path,
        text: Some(recovered_path.clone()),
        force: false,
        mode: terminator_mode(),
    })?;

    assert_eq!(fs::read_to_string(&recovered_path)?, "hidden behind a terminator");
    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_hide_and_recover_with_defaults() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");
    let source_text_path = dir.path().join("source.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "Testing default path generation. 测试默认路径生成。";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_hide，不提供 dest 路径
    handle_hide(HideArgs {
        image: original_image_path.clone(),
        text: source_text_path.clone(),
        dest: None,
        force: false,
        mode: ModeArgs::default(),
    })?;

    let expected_hidden_path = dir.path().join("doctored_original.png");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    // 3. 测试 handle_recover，不提供 text 输出路径
    handle_recover(RecoverArgs {
        image: expected_hidden_path,
        text: None,
        force: false,
        mode: ModeArgs::default(),
    })?;

    let expected_recovered_path = dir.path().join("recovered_doctored_original.txt");
    assert!(
        expected_recovered_path.exists(),
        "Default recovered text file should be created at: {:?}",
        expected_recovered_path
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&expected_recovered_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text from default file must match the original."
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.png");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "some text")?;

    // 先创建一个同名的目标文件，模拟“文件已存在”的场景
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;

    let result = handle_hide(HideArgs {
        image: image_path.clone(),
        text: text_path.clone(),
        dest: Some(dest_path.clone()),
        force: false,
        mode: ModeArgs::default(),
    });
    assert!(result.is_err(), "Execution should fail without --force when file exists.");
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    let result = handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(dest_path.clone()),
        force: true,
        mode: ModeArgs::default(),
    });
    assert!(result.is_ok(), "Execution should succeed with --force when file exists.");

    let overwritten = fs::read(&dest_path)?;
    assert_ne!(overwritten, b"this is a dummy file to be overwritten");

    Ok(())
}

/// 验证空间不足时的错误处理，且不会生成输出文件
#[test]
fn test_handle_hide_not_enough_space() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("small.png");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.png");

    create_test_image(&image_path, 10, 10);
    fs::write(&text_path, "a".repeat(5000))?;

    let result = handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(dest_path.clone()),
        force: false,
        mode: ModeArgs::default(),
    });

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough space"));
    }
    assert!(!dest_path.exists());

    Ok(())
}

/// 找不到终止符时应报告错误，并写出未终止的部分数据
#[test]
fn test_recover_without_terminator_writes_partial_data() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("black.png");
    let text_path = dir.path().join("partial.txt");

    // 全黑图像的 LSB 全为 0，不可能包含终止符
    RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])).save(&image_path)?;

    let result = handle_recover(RecoverArgs {
        image: image_path,
        text: Some(text_path.clone()),
        force: false,
        mode: terminator_mode(),
    });

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Terminator not found"));
    }
    // 8 x 8 像素 x 3 通道 = 192 位 = 24 字节
    assert_eq!(fs::read(&text_path)?, vec![0u8; 24]);

    Ok(())
}

/// 纯色图像的分析结果应为概率 0
#[test]
fn test_analyze_flat_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("flat.png");
    RgbaImage::from_pixel(16, 16, Rgba([100, 120, 140, 255])).save(&image_path)?;

    let report = handle_analyze(AnalyzeArgs { image: image_path })?;

    assert_eq!(report.probability, 0.0);
    assert!(!report.is_stego);
    Ok(())
}

/// 单像素图像无法分析，应返回错误而不是概率 0
#[test]
fn test_analyze_single_pixel_is_an_error() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("dot.png");
    RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255])).save(&image_path)?;

    assert!(handle_analyze(AnalyzeArgs { image: image_path }).is_err());
    Ok(())
}

/// 清除 LSB 后，图像中的载荷不可再恢复
#[test]
fn test_sanitize_destroys_payload() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("cover.png");
    let text_path = dir.path().join("secret.txt");
    let stego_path = dir.path().join("stego.png");

    create_test_image(&image_path, 30, 30);
    fs::write(&text_path, "gone after sanitizing")?;

    handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(stego_path.clone()),
        force: false,
        mode: ModeArgs::default(),
    })?;
    handle_sanitize(SanitizeArgs {
        image: stego_path.clone(),
        dest: None,
        force: false,
    })?;

    let sanitized_path = dir.path().join("sanitized_stego.png");
    let grid = PixelGrid::from(&image::open(&sanitized_path)?);
    assert!(grid.slots().all(|value| value & 1 == 0));

    let result = handle_recover(RecoverArgs {
        image: sanitized_path,
        text: None,
        force: false,
        mode: ModeArgs::default(),
    });
    assert!(result.is_err());

    Ok(())
}

/// 验证载荷扫描的步数
#[test]
fn test_handle_sweep() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("cover.png");
    create_test_image(&image_path, 32, 32);

    let points = handle_sweep(SweepArgs {
        image: image_path,
        steps: 3,
        trials: 1,
        terminator: "endmessage".to_string(),
    })?;

    // 容量为 32 * 32 * 3 / 8 - 10 = 374 字节，步长 124
    assert_eq!(
        points.iter().map(|p| p.payload_bytes).collect::<Vec<_>>(),
        vec![10, 134, 258]
    );
    Ok(())
}
