//! Face anonymization for video streams.
//!
//! Frames flow from a [`VideoReader`](video::domain::video_reader::VideoReader)
//! through a face detector and a region transform (blur, pixelate or black
//! fill) into a [`VideoWriter`](video::domain::video_writer::VideoWriter).
//! Each area keeps its traits under `domain` and the concrete ffmpeg/ONNX
//! backed implementations under `infrastructure`.

pub mod anonymization {
    pub mod domain {
        pub mod anonymization_method;
        pub mod region_transform;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod box_padding;
        pub mod detector_options;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod anonymize_video_use_case;
    pub mod frame_anonymizer;
    pub mod output_filename;
    pub mod pipeline_logger;
    pub mod processing_config;
}

pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod frame_preview;
        pub mod image_writer;
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_reader;
        pub mod ffmpeg_writer;
        pub mod image_file_writer;
        pub mod snapshot_preview;
    }
}
